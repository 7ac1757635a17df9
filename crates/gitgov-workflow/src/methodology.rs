// SPDX-License-Identifier: MIT OR Apache-2.0
//! The methodology engine: resolves transition rules and evaluates
//! signature gates and custom rule predicates over a loaded document.

use gitgov_record::Signature;
use tracing::warn;

use crate::document::{CustomRuleKind, MethodologyDocument, Requires, SignatureRule};
use crate::error::{Result, WorkflowError};

const KANBAN_JSON: &str = include_str!("../assets/kanban_workflow.json");
const SCRUM_JSON: &str = include_str!("../assets/scrum_workflow.json");

/// Everything `validateSignature`/`validateCustomRules` need to know about
/// the task, actor, and in-flight signature set for one transition attempt.
#[derive(Debug, Clone, Default)]
pub struct TransitionContext {
    /// The target state of this transition attempt, if known.
    pub transition_to: Option<String>,
    /// The task's current status before the transition is applied.
    pub task_status: String,
    /// The task's tags (used by `epic_complexity`).
    pub task_tags: Vec<String>,
    /// The cycle ids the task references (used by `sprint_capacity`).
    pub task_cycle_ids: Vec<String>,
    /// Whether any cycle referenced by the task is currently `active`
    /// (pre-resolved by the caller; `sprint_capacity`).
    pub has_active_cycle: bool,
    /// Whether the task (tagged `epic:*`) has at least one child cycle
    /// (pre-resolved by the caller; `epic_complexity`).
    pub epic_has_child_cycle: bool,
    /// Whether a resolved `assignment` feedback exists for the task
    /// (pre-resolved by the caller; `assignment_required`).
    pub assignment_resolved: bool,
    /// Roles held by the signing actor.
    pub actor_roles: Vec<String>,
    /// Signatures accumulated for this transition attempt so far (spec:
    /// `context.signatures ?? [signature]`). Empty means "just the one
    /// signature passed to `validateSignature`".
    pub signatures: Vec<Signature>,
}

/// A loaded methodology, bound to one document, evaluating transition
/// legality, signature gates, and custom rules.
#[derive(Debug, Clone)]
pub struct WorkflowMethodology {
    doc: MethodologyDocument,
}

impl WorkflowMethodology {
    /// Load a methodology from a JSON document, schema-validating it.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(Self {
            doc: MethodologyDocument::from_json(text)?,
        })
    }

    /// Load a pre-parsed document directly (e.g. a user-supplied one already
    /// validated elsewhere).
    #[must_use]
    pub fn from_document(doc: MethodologyDocument) -> Self {
        Self { doc }
    }

    /// The bundled kanban methodology.
    pub fn create_default() -> Self {
        Self::from_json(KANBAN_JSON).expect("bundled kanban_workflow.json is valid")
    }

    /// The bundled scrum methodology.
    pub fn create_scrum() -> Self {
        Self::from_json(SCRUM_JSON).expect("bundled scrum_workflow.json is valid")
    }

    /// The document's name (e.g. `"kanban"`).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.doc.name
    }

    /// Return the `requires` block for reaching `to` from `from`, or `None`
    /// if `to` is not a declared target or `from` is not in its `from` list.
    #[must_use]
    pub fn get_transition_rule(&self, from: &str, to: &str) -> Option<&Requires> {
        let entry = self.doc.state_transitions.get(to)?;
        entry.from.iter().any(|f| f == from).then_some(&entry.requires)
    }

    /// Enumerate every `(targetState, requires)` pair reachable from `from`.
    #[must_use]
    pub fn get_available_transitions(&self, from: &str) -> Vec<(String, &Requires)> {
        self.doc
            .state_transitions
            .iter()
            .filter(|(_, entry)| entry.from.iter().any(|f| f == from))
            .map(|(to, entry)| (to.clone(), &entry.requires))
            .collect()
    }

    /// Validate `signature` against the signature gate for the transition
    /// named by `ctx.transition_to`, from `ctx.task_status`.
    ///
    /// # Errors
    /// Returns [`WorkflowError::MissingTransitionTo`] if `ctx.transition_to`
    /// is `None`.
    pub fn validate_signature(&self, signature: &Signature, ctx: &TransitionContext) -> Result<bool> {
        let to = ctx
            .transition_to
            .as_deref()
            .ok_or(WorkflowError::MissingTransitionTo)?;

        let Some(requires) = self.get_transition_rule(&ctx.task_status, to) else {
            return Ok(false);
        };
        let Some(sig_rules) = &requires.signatures else {
            return Ok(true);
        };

        let rule = sig_rules
            .iter()
            .filter(|(name, _)| name.as_str() != "__default__")
            .find(|(_, r)| r.capability_roles.iter().any(|cr| ctx.actor_roles.contains(cr)))
            .map(|(_, r)| r)
            .or_else(|| sig_rules.get("__default__"));

        let Some(rule) = rule else {
            return Ok(false);
        };

        if signature.role != rule.role {
            return Ok(false);
        }
        if !ctx.actor_roles.iter().any(|r| rule.capability_roles.contains(r)) {
            return Ok(false);
        }

        let qualifying = if ctx.signatures.is_empty() {
            usize::from(signature.role == rule.role)
        } else {
            ctx.signatures.iter().filter(|s| s.role == rule.role).count()
        };

        Ok(qualifying >= rule.min_approvals as usize)
    }

    /// Resolve which [`SignatureRule`] group a transition's signature gate
    /// would apply to an actor holding `actor_roles`: the first non-default
    /// group whose `capability_roles` intersect `actor_roles`, falling back
    /// to `__default__`. Callers use this to learn which `role` to pass to
    /// `IdentityAdapter::sign_record` *before* producing the signature that
    /// [`WorkflowMethodology::validate_signature`] then checks.
    #[must_use]
    pub fn resolve_signature_rule(&self, from: &str, to: &str, actor_roles: &[String]) -> Option<SignatureRule> {
        let requires = self.get_transition_rule(from, to)?;
        let sig_rules = requires.signatures.as_ref()?;
        sig_rules
            .iter()
            .filter(|(name, _)| name.as_str() != "__default__")
            .find(|(_, r)| r.capability_roles.iter().any(|cr| actor_roles.contains(cr)))
            .map(|(_, r)| r.clone())
            .or_else(|| sig_rules.get("__default__").cloned())
    }

    /// Evaluate every rule id in `rule_ids`; all must pass.
    #[must_use]
    pub fn validate_custom_rules(&self, rule_ids: &[String], ctx: &TransitionContext) -> bool {
        rule_ids.iter().all(|id| self.validate_custom_rule(id, ctx))
    }

    fn validate_custom_rule(&self, rule_id: &str, ctx: &TransitionContext) -> bool {
        let Some(def) = self.doc.custom_rules.get(rule_id) else {
            warn!(rule_id, "unknown custom rule id; failing transition");
            return false;
        };

        match def.validation {
            CustomRuleKind::AssignmentRequired => ctx.assignment_resolved,
            CustomRuleKind::SprintCapacity => ctx.has_active_cycle,
            CustomRuleKind::EpicComplexity => {
                let is_epic = ctx.task_tags.iter().any(|t| t.starts_with("epic:"));
                if !is_epic {
                    true
                } else {
                    ctx.task_status == "paused" && ctx.epic_has_child_cycle
                }
            }
            CustomRuleKind::Custom => {
                tracing::info!(rule_id, "custom rule extension point invoked; passing");
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(role: &str) -> Signature {
        Signature::placeholder(role, role)
    }

    #[test]
    fn kanban_transition_rule_resolves() {
        let wf = WorkflowMethodology::create_default();
        assert!(wf.get_transition_rule("draft", "review").is_some());
        assert!(wf.get_transition_rule("draft", "active").is_none());
    }

    #[test]
    fn available_transitions_from_draft() {
        let wf = WorkflowMethodology::create_default();
        let targets: Vec<String> = wf
            .get_available_transitions("draft")
            .into_iter()
            .map(|(to, _)| to)
            .collect();
        assert!(targets.contains(&"review".to_string()));
        assert!(targets.contains(&"discarded".to_string()));
    }

    #[test]
    fn validate_signature_requires_transition_to() {
        let wf = WorkflowMethodology::create_default();
        let ctx = TransitionContext {
            task_status: "draft".into(),
            ..Default::default()
        };
        let err = wf.validate_signature(&sig("author"), &ctx).unwrap_err();
        assert_eq!(err.code(), "MISSING_TRANSITION_TO");
    }

    #[test]
    fn validate_signature_accepts_matching_role_and_capability() {
        let wf = WorkflowMethodology::create_default();
        let ctx = TransitionContext {
            transition_to: Some("review".into()),
            task_status: "draft".into(),
            actor_roles: vec!["author".into()],
            ..Default::default()
        };
        assert!(wf.validate_signature(&sig("author"), &ctx).unwrap());
    }

    #[test]
    fn validate_signature_rejects_missing_capability_role() {
        let wf = WorkflowMethodology::create_default();
        let ctx = TransitionContext {
            transition_to: Some("ready".into()),
            task_status: "review".into(),
            actor_roles: vec!["author".into()],
            ..Default::default()
        };
        assert!(!wf.validate_signature(&sig("approver"), &ctx).unwrap());
    }

    #[test]
    fn resolve_signature_rule_picks_matching_capability_group() {
        let wf = WorkflowMethodology::create_default();
        let rule = wf
            .resolve_signature_rule("review", "ready", &["approver:product".to_string()])
            .unwrap();
        assert_eq!(rule.role, "approver");
    }

    #[test]
    fn resolve_signature_rule_none_when_no_gate() {
        let wf = WorkflowMethodology::create_default();
        assert!(wf.resolve_signature_rule("active", "paused", &["author".to_string()]).is_none());
    }

    #[test]
    fn custom_rule_assignment_required() {
        let wf = WorkflowMethodology::create_default();
        let mut ctx = TransitionContext::default();
        assert!(!wf.validate_custom_rules(&["assignment_required".to_string()], &ctx));
        ctx.assignment_resolved = true;
        assert!(wf.validate_custom_rules(&["assignment_required".to_string()], &ctx));
    }

    #[test]
    fn custom_rule_epic_complexity_vacuous_for_non_epics() {
        let wf = WorkflowMethodology::create_default();
        let ctx = TransitionContext {
            task_tags: vec!["backend".into()],
            task_status: "active".into(),
            ..Default::default()
        };
        assert!(wf.validate_custom_rules(&["epic_complexity".to_string()], &ctx));
    }

    #[test]
    fn custom_rule_epic_complexity_requires_paused_and_child_cycle() {
        let wf = WorkflowMethodology::create_default();
        let ctx = TransitionContext {
            task_tags: vec!["epic:payments".into()],
            task_status: "active".into(),
            epic_has_child_cycle: true,
            ..Default::default()
        };
        assert!(!wf.validate_custom_rules(&["epic_complexity".to_string()], &ctx));

        let ctx2 = TransitionContext {
            task_status: "paused".into(),
            ..ctx
        };
        assert!(wf.validate_custom_rules(&["epic_complexity".to_string()], &ctx2));
    }

    #[test]
    fn unknown_custom_rule_fails_closed() {
        let wf = WorkflowMethodology::create_default();
        assert!(!wf.validate_custom_rules(&["nonexistent".to_string()], &TransitionContext::default()));
    }

    #[test]
    fn scrum_methodology_loads() {
        let wf = WorkflowMethodology::create_scrum();
        assert_eq!(wf.name(), "scrum");
    }
}
