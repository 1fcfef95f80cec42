use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::validation::ValidationError;

/// Binary eligibility rules. Failing any enabled one excludes the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HardConstraint {
    ActiveDriver,
    WorkingHours,
    RegionMatch,
    VehicleMatch,
    SlotCapacity,
}

impl HardConstraint {
    pub const ALL: [HardConstraint; 5] = [
        HardConstraint::ActiveDriver,
        HardConstraint::WorkingHours,
        HardConstraint::RegionMatch,
        HardConstraint::VehicleMatch,
        HardConstraint::SlotCapacity,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            HardConstraint::ActiveDriver => "activeDriver",
            HardConstraint::WorkingHours => "workingHours",
            HardConstraint::RegionMatch => "regionMatch",
            HardConstraint::VehicleMatch => "vehicleMatch",
            HardConstraint::SlotCapacity => "slotCapacity",
        }
    }
}

/// Weighted ranking components applied to eligible drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SoftRule {
    RegionScore,
    LoadBalanceScore,
    FairnessScore,
}

impl SoftRule {
    pub const ALL: [SoftRule; 3] = [
        SoftRule::RegionScore,
        SoftRule::LoadBalanceScore,
        SoftRule::FairnessScore,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            SoftRule::RegionScore => "regionScore",
            SoftRule::LoadBalanceScore => "loadBalanceScore",
            SoftRule::FairnessScore => "fairnessScore",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoftRuleSetting {
    pub enabled: bool,
    pub weight: f64,
}

impl SoftRuleSetting {
    pub const DISABLED: SoftRuleSetting = SoftRuleSetting {
        enabled: false,
        weight: 0.0,
    };

    pub const fn weighted(weight: f64) -> Self {
        Self {
            enabled: true,
            weight,
        }
    }
}

/// Assignment policy handed over by the settings store.
///
/// Hard constraints missing from the map are enforced; soft rules missing
/// from the map are off. Weights are relative and need not sum to one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentConfig {
    #[serde(default = "default_auto_assign")]
    pub auto_assign_enabled: bool,
    #[serde(default)]
    pub hard_constraints: BTreeMap<HardConstraint, bool>,
    #[serde(default)]
    pub soft_rules: BTreeMap<SoftRule, SoftRuleSetting>,
}

fn default_auto_assign() -> bool {
    true
}

impl Default for AssignmentConfig {
    fn default() -> Self {
        let hard_constraints = HardConstraint::ALL
            .into_iter()
            .map(|constraint| (constraint, true))
            .collect();

        let mut soft_rules = BTreeMap::new();
        soft_rules.insert(SoftRule::RegionScore, SoftRuleSetting::weighted(0.4));
        soft_rules.insert(SoftRule::LoadBalanceScore, SoftRuleSetting::weighted(0.35));
        soft_rules.insert(SoftRule::FairnessScore, SoftRuleSetting::weighted(0.25));

        Self {
            auto_assign_enabled: true,
            hard_constraints,
            soft_rules,
        }
    }
}

impl AssignmentConfig {
    pub fn is_enforced(&self, constraint: HardConstraint) -> bool {
        self.hard_constraints
            .get(&constraint)
            .copied()
            .unwrap_or(true)
    }

    pub fn soft_rule(&self, rule: SoftRule) -> SoftRuleSetting {
        self.soft_rules
            .get(&rule)
            .copied()
            .unwrap_or(SoftRuleSetting::DISABLED)
    }

    /// Enabled soft rules with their weights, in a stable order.
    pub fn active_soft_rules(&self) -> Vec<(SoftRule, f64)> {
        SoftRule::ALL
            .into_iter()
            .filter_map(|rule| {
                let setting = self.soft_rule(rule);
                setting.enabled.then_some((rule, setting.weight))
            })
            .collect()
    }

    pub fn with_constraint(mut self, constraint: HardConstraint, enabled: bool) -> Self {
        self.hard_constraints.insert(constraint, enabled);
        self
    }

    pub fn with_soft_rule(mut self, rule: SoftRule, setting: SoftRuleSetting) -> Self {
        self.soft_rules.insert(rule, setting);
        self
    }

    /// Turn every soft rule off, leaving selection to the tie-break.
    pub fn without_soft_rules(mut self) -> Self {
        for rule in SoftRule::ALL {
            self.soft_rules.insert(rule, SoftRuleSetting::DISABLED);
        }
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for (rule, setting) in &self.soft_rules {
            if !setting.weight.is_finite() || setting.weight < 0.0 {
                return Err(ValidationError::InvalidWeight {
                    rule: rule.key(),
                    weight: setting.weight,
                });
            }
        }
        let sum: f64 = self
            .active_soft_rules()
            .iter()
            .map(|(_, weight)| weight)
            .sum();
        if !sum.is_finite() {
            return Err(ValidationError::InvalidWeightSum(sum));
        }
        Ok(())
    }
}
