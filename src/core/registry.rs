//! Evidence registry: static definitions plus the action → transitions table
//!
//! Built once and validated at load. Any structural problem in the tables
//! is a programmer error and fails construction with a `RegistryError`
//! naming the offending key, slot or action.

use std::collections::{BTreeMap, BTreeSet};
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use crate::{PRIMARY_EVIDENCE_KEY, REGISTRY_VERSION};
use crate::types::{EvidenceDefinition, EvidenceLevel, EvidenceTransition, TransitionKind};

/// Action that wipes the whole ledger
pub const RESET_ACTION: &str = "boot:local:reset";

lazy_static! {
    /// Namespaced lowercase names: `segment:segment[:segment[:segment]]`
    static ref RE_NAME: Regex = Regex::new(
        r"^[a-z][a-z0-9-]*(:[a-z0-9][a-z0-9-]*){1,3}$"
    ).unwrap();

    static ref STANDARD_REGISTRY: EvidenceRegistry = standard_registry()
        .unwrap_or_else(|e| panic!("built-in evidence registry is invalid: {e}"));
}

/// Structural problems in registry tables
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("duplicate evidence key: {key}")]
    DuplicateKey { key: String },

    #[error("duplicate registry slot {slot} (keys {first} and {second})")]
    DuplicateSlot { slot: u16, first: String, second: String },

    #[error("registry slot {slot} is missing (slots must run 1..={count})")]
    MissingSlot { slot: u16, count: usize },

    #[error("evidence key {key} has no stable id alias")]
    MissingAlias { key: String },

    #[error("stable id {alias} is used by both {first} and {second}")]
    DuplicateAlias { alias: String, first: String, second: String },

    #[error("malformed evidence key: {key}")]
    InvalidKey { key: String },

    #[error("malformed action name {action} (referenced by {context})")]
    InvalidActionName { action: String, context: String },

    #[error("action {action} references unknown evidence key {key}")]
    UnknownEvidenceKey { action: String, key: String },

    #[error("action {action} maps to {key} more than once")]
    DuplicateRule { action: String, key: String },
}

/// One row of the action table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRule {
    pub action: String,
    pub key: String,
    pub kind: TransitionKind,
}

impl ActionRule {
    pub fn new(action: &str, key: &str, kind: TransitionKind) -> Self {
        Self {
            action: action.to_string(),
            key: key.to_string(),
            kind,
        }
    }
}

/// Validated registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceRegistry {
    version: u32,
    /// Sorted by slot
    definitions: Vec<EvidenceDefinition>,
    actions: BTreeMap<String, Vec<EvidenceTransition>>,
}

impl EvidenceRegistry {
    /// Validate definitions and rules, then build the lookup table
    ///
    /// Explicit rules come first for an action, followed by `unsatisfy`
    /// transitions derived from each definition's blocker list (slot order).
    pub fn new(
        version: u32,
        definitions: Vec<EvidenceDefinition>,
        rules: Vec<ActionRule>,
    ) -> Result<Self, RegistryError> {
        let mut definitions = definitions;
        validate_definitions(&definitions)?;
        definitions.sort_by_key(|d| d.slot);

        let known: BTreeSet<&str> = definitions.iter().map(|d| d.key.as_str()).collect();
        let mut actions: BTreeMap<String, Vec<EvidenceTransition>> = BTreeMap::new();

        for rule in &rules {
            check_action_name(&rule.action, "action table")?;
            if !known.contains(rule.key.as_str()) {
                return Err(RegistryError::UnknownEvidenceKey {
                    action: rule.action.clone(),
                    key: rule.key.clone(),
                });
            }
            push_transition(&mut actions, &rule.action, &rule.key, rule.kind)?;
        }

        for def in &definitions {
            for blocker in &def.blockers {
                check_action_name(blocker, &def.key)?;
                push_transition(&mut actions, blocker, &def.key, TransitionKind::Unsatisfy)?;
            }
        }

        Ok(Self {
            version,
            definitions,
            actions,
        })
    }

    /// The built-in registry, validated on first use
    pub fn standard() -> &'static EvidenceRegistry {
        &STANDARD_REGISTRY
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Definitions in slot order
    pub fn definitions(&self) -> &[EvidenceDefinition] {
        &self.definitions
    }

    pub fn definition(&self, key: &str) -> Option<&EvidenceDefinition> {
        self.definitions.iter().find(|d| d.key == key)
    }

    /// Blocker-level keys in slot order
    pub fn blocker_keys(&self) -> impl Iterator<Item = &str> {
        self.definitions
            .iter()
            .filter(|d| d.level == EvidenceLevel::Blocker)
            .map(|d| d.key.as_str())
    }

    /// Transitions an action triggers; unknown actions trigger none
    pub fn transitions_for_action(&self, action: &str) -> Vec<EvidenceTransition> {
        self.actions.get(action).cloned().unwrap_or_default()
    }

    /// Every action name the table knows, sorted
    pub fn known_actions(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    pub fn is_reset_action(&self, action: &str) -> bool {
        action == RESET_ACTION
    }
}

fn validate_definitions(definitions: &[EvidenceDefinition]) -> Result<(), RegistryError> {
    let mut keys: BTreeSet<&str> = BTreeSet::new();
    let mut slots: BTreeMap<u16, &str> = BTreeMap::new();
    let mut aliases: BTreeMap<&str, &str> = BTreeMap::new();

    for def in definitions {
        if !RE_NAME.is_match(&def.key) {
            return Err(RegistryError::InvalidKey { key: def.key.clone() });
        }
        if !keys.insert(def.key.as_str()) {
            return Err(RegistryError::DuplicateKey { key: def.key.clone() });
        }
        if let Some(first) = slots.insert(def.slot, def.key.as_str()) {
            return Err(RegistryError::DuplicateSlot {
                slot: def.slot,
                first: first.to_string(),
                second: def.key.clone(),
            });
        }
        if def.stable_id.trim().is_empty() {
            return Err(RegistryError::MissingAlias { key: def.key.clone() });
        }
        if let Some(first) = aliases.insert(def.stable_id.as_str(), def.key.as_str()) {
            return Err(RegistryError::DuplicateAlias {
                alias: def.stable_id.clone(),
                first: first.to_string(),
                second: def.key.clone(),
            });
        }
    }

    let count = definitions.len();
    for slot in 1..=count {
        let slot = slot as u16;
        if !slots.contains_key(&slot) {
            return Err(RegistryError::MissingSlot { slot, count });
        }
    }
    Ok(())
}

fn check_action_name(action: &str, context: &str) -> Result<(), RegistryError> {
    if RE_NAME.is_match(action) {
        Ok(())
    } else {
        Err(RegistryError::InvalidActionName {
            action: action.to_string(),
            context: context.to_string(),
        })
    }
}

fn push_transition(
    actions: &mut BTreeMap<String, Vec<EvidenceTransition>>,
    action: &str,
    key: &str,
    kind: TransitionKind,
) -> Result<(), RegistryError> {
    let list = actions.entry(action.to_string()).or_default();
    if list.iter().any(|t| t.key == key) {
        return Err(RegistryError::DuplicateRule {
            action: action.to_string(),
            key: key.to_string(),
        });
    }
    list.push(EvidenceTransition::new(key, kind));
    Ok(())
}

fn definition(
    slot: u16,
    key: &str,
    stable_id: &str,
    title: &str,
    description: &str,
    level: EvidenceLevel,
    blockers: &[&str],
) -> EvidenceDefinition {
    EvidenceDefinition {
        key: key.to_string(),
        stable_id: stable_id.to_string(),
        slot,
        title: title.to_string(),
        description: description.to_string(),
        level,
        blockers: blockers.iter().map(|b| b.to_string()).collect(),
    }
}

fn standard_registry() -> Result<EvidenceRegistry, RegistryError> {
    use EvidenceLevel::{Blocker, Informational};
    use TransitionKind::{Noop, Satisfy};

    let definitions = vec![
        definition(
            1,
            PRIMARY_EVIDENCE_KEY,
            "EV-SYS-ARMED",
            "System armed",
            "The operator armed the deck through the boot ritual or an explicit confirm",
            Blocker,
            &["boot:arm:revoked"],
        ),
        definition(
            2,
            "evidence:boot:drag",
            "EV-BOOT-DRAG",
            "Boot drag",
            "Boot console drag travelled the full threshold",
            Informational,
            &["gesture:boot-ritual:cancelled"],
        ),
        definition(
            3,
            "evidence:boot:hold",
            "EV-BOOT-HOLD",
            "Boot hold",
            "Boot console hold accumulated the full duration",
            Informational,
            &["gesture:boot-ritual:cancelled"],
        ),
        definition(
            4,
            "evidence:boot:sealed",
            "EV-BOOT-SEALED",
            "Boot sealed",
            "Boot ritual released on its anchor and sealed",
            Informational,
            &[],
        ),
        definition(
            5,
            "evidence:route:graph-link",
            "EV-ROUTE-LINK",
            "Route graph link",
            "Route slide graph link engaged by a full drag",
            Informational,
            &["gesture:route-ritual:cancelled"],
        ),
        definition(
            6,
            "evidence:route:sealed",
            "EV-ROUTE-SEALED",
            "Route sealed",
            "Route ritual completed and sealed",
            Informational,
            &[],
        ),
    ];

    let rules = vec![
        ActionRule::new("boot:arm:requested", PRIMARY_EVIDENCE_KEY, Noop),
        ActionRule::new("boot:arm:confirmed", PRIMARY_EVIDENCE_KEY, Satisfy),
        ActionRule::new("boot:override:enabled", PRIMARY_EVIDENCE_KEY, Noop),
        ActionRule::new("boot:override:disabled", PRIMARY_EVIDENCE_KEY, Noop),
        ActionRule::new("evidence:boot-primary:satisfied", PRIMARY_EVIDENCE_KEY, Satisfy),
        ActionRule::new("evidence:boot-primary:satisfied", "evidence:boot:sealed", Satisfy),
        ActionRule::new("gesture:boot-drag:completed", "evidence:boot:drag", Satisfy),
        ActionRule::new("gesture:boot-hold:completed", "evidence:boot:hold", Satisfy),
        ActionRule::new("anchor:route-graph-link:engaged", "evidence:route:graph-link", Satisfy),
        ActionRule::new("evidence:route-primary:satisfied", "evidence:route:sealed", Satisfy),
    ];

    EvidenceRegistry::new(REGISTRY_VERSION, definitions, rules)
}

// =============================================================================
// TESTS
// =============================================================================
