// SPDX-License-Identifier: MIT OR Apache-2.0
use ed25519_dalek::SigningKey;
use gitgov_record::{checksum, sign, verify, Kind, UnsignedRecord};
use proptest::prelude::*;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Payload {
    title: String,
    priority: u32,
    tags: Vec<String>,
}

proptest! {
    #[test]
    fn checksum_is_pure_function_of_payload(title in ".*", priority in 0u32..100, tags in proptest::collection::vec(".*", 0..5)) {
        let p = Payload { title, priority, tags };
        let h1 = checksum(&p).unwrap();
        let h2 = checksum(&p).unwrap();
        prop_assert_eq!(h1, h2);
    }

    #[test]
    fn sign_then_verify_always_succeeds_for_matching_key(title in ".*", priority in 0u32..100) {
        let sk = SigningKey::generate(&mut OsRng);
        let vk = sk.verifying_key();
        let payload = Payload { title, priority, tags: vec![] };
        let unsigned = UnsignedRecord::new(Kind::Task, payload).unwrap();
        let sig = sign(unsigned.payload(), &sk, "human:p", "author", "").unwrap();
        let record = unsigned.into_signed(sig);
        prop_assert!(verify(&record, |id| if id == "human:p" { Some(vk) } else { None }).is_ok());
    }
}
