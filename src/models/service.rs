use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DepositRule {
    Percentage { value: u8 },
    Fixed { amount: f64 },
}

impl Default for DepositRule {
    fn default() -> Self {
        DepositRule::Percentage { value: 20 }
    }
}

impl DepositRule {
    pub fn kind(&self) -> &'static str {
        match self {
            DepositRule::Percentage { .. } => "percentage",
            DepositRule::Fixed { .. } => "fixed",
        }
    }

    pub fn value(&self) -> f64 {
        match self {
            DepositRule::Percentage { value } => f64::from(*value),
            DepositRule::Fixed { amount } => *amount,
        }
    }

    pub fn from_parts(kind: &str, value: f64) -> Self {
        match kind {
            "fixed" => DepositRule::Fixed { amount: value },
            _ => DepositRule::Percentage {
                value: value.clamp(0.0, 100.0).round() as u8,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    #[serde(rename = "duration")]
    pub duration_minutes: i32,
    pub price: f64,
    pub deposit_required: bool,
    pub deposit_rule: DepositRule,
    pub available: bool,
}

impl Service {
    /// Deposit owed when booking this service at its current price.
    pub fn deposit_amount(&self) -> f64 {
        if !self.deposit_required {
            return 0.0;
        }
        match self.deposit_rule {
            DepositRule::Percentage { value } => (self.price * f64::from(value) / 100.0).round(),
            DepositRule::Fixed { amount } => amount.min(self.price),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewService {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub duration: Option<i32>,
    pub price: Option<f64>,
    pub deposit_required: Option<bool>,
    pub deposit_percentage: Option<u8>,
    pub deposit_amount: Option<f64>,
    pub available: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub duration: Option<i32>,
    pub price: Option<f64>,
    pub deposit_required: Option<bool>,
    pub deposit_percentage: Option<u8>,
    pub deposit_amount: Option<f64>,
    pub available: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(price: f64, required: bool, rule: DepositRule) -> Service {
        Service {
            id: "srv_test".to_string(),
            name: "Hydrafacial".to_string(),
            category: "Facials".to_string(),
            description: String::new(),
            duration_minutes: 60,
            price,
            deposit_required: required,
            deposit_rule: rule,
            available: true,
        }
    }

    #[test]
    fn test_percentage_deposit_rounds() {
        let s = service(250.0, true, DepositRule::Percentage { value: 20 });
        assert_eq!(s.deposit_amount(), 50.0);
        let s = service(333.0, true, DepositRule::Percentage { value: 25 });
        assert_eq!(s.deposit_amount(), 83.0);
    }

    #[test]
    fn test_fixed_deposit_capped_at_price() {
        let s = service(40.0, true, DepositRule::Fixed { amount: 75.0 });
        assert_eq!(s.deposit_amount(), 40.0);
        let s = service(400.0, true, DepositRule::Fixed { amount: 75.0 });
        assert_eq!(s.deposit_amount(), 75.0);
    }

    #[test]
    fn test_no_deposit_when_not_required() {
        let s = service(400.0, false, DepositRule::Percentage { value: 20 });
        assert_eq!(s.deposit_amount(), 0.0);
    }

    #[test]
    fn test_rule_from_parts() {
        assert_eq!(
            DepositRule::from_parts("fixed", 50.0),
            DepositRule::Fixed { amount: 50.0 }
        );
        assert_eq!(
            DepositRule::from_parts("percentage", 25.0),
            DepositRule::Percentage { value: 25 }
        );
    }
}
