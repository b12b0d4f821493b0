use crate::error::invalid_input;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const DURATION_DAYS_MIN: u32 = 1;
pub const DURATION_DAYS_MAX: u32 = 14;

/// How loosely the couple has committed to a wedding date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateFlexibility {
    SpecificDate,
    Within3Months,
    Within6Months,
    Within12Months,
}

impl DateFlexibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateFlexibility::SpecificDate => "specific_date",
            DateFlexibility::Within3Months => "within_3_months",
            DateFlexibility::Within6Months => "within_6_months",
            DateFlexibility::Within12Months => "within_12_months",
        }
    }
}

impl FromStr for DateFlexibility {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "specific_date" => Ok(DateFlexibility::SpecificDate),
            "within_3_months" => Ok(DateFlexibility::Within3Months),
            "within_6_months" => Ok(DateFlexibility::Within6Months),
            "within_12_months" => Ok(DateFlexibility::Within12Months),
            other => Err(invalid_input(
                "flexibility",
                other,
                "one of specific_date, within_3_months, within_6_months, within_12_months",
            )),
        }
    }
}

/// The couple's scheduling constraints, validated at the boundary before any
/// engine runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulePreferences {
    pub flexibility: DateFlexibility,
    pub duration_days: u32,
    /// Required (and `>= 0`) only when `flexibility` is `specific_date`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_until_wedding: Option<i64>,
}

impl SchedulePreferences {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure_duration_days(self.duration_days)?;

        if self.flexibility == DateFlexibility::SpecificDate {
            match self.days_until_wedding {
                None => {
                    return Err(invalid_input(
                        "days_until_wedding",
                        "none",
                        "a non-negative day count when flexibility is specific_date",
                    ))
                }
                Some(days) if days < 0 => {
                    return Err(invalid_input(
                        "days_until_wedding",
                        days,
                        "a non-negative day count",
                    ))
                }
                Some(_) => {}
            }
        }

        Ok(())
    }
}

/// Shared duration check; both engines enforce the same celebration window.
pub fn ensure_duration_days(duration_days: u32) -> anyhow::Result<()> {
    if !(DURATION_DAYS_MIN..=DURATION_DAYS_MAX).contains(&duration_days) {
        return Err(invalid_input(
            "duration_days",
            duration_days,
            "a value in [1, 14]",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InvalidInputError;

    fn prefs(
        flexibility: DateFlexibility,
        duration_days: u32,
        days_until_wedding: Option<i64>,
    ) -> SchedulePreferences {
        SchedulePreferences {
            flexibility,
            duration_days,
            days_until_wedding,
        }
    }

    #[test]
    fn accepts_flexible_window_without_day_count() {
        prefs(DateFlexibility::Within6Months, 3, None)
            .validate()
            .unwrap();
    }

    #[test]
    fn specific_date_requires_day_count() {
        let err = prefs(DateFlexibility::SpecificDate, 1, None)
            .validate()
            .unwrap_err();
        let input = err.downcast_ref::<InvalidInputError>().unwrap();
        assert_eq!(input.field, "days_until_wedding");
    }

    #[test]
    fn specific_date_rejects_negative_day_count() {
        let err = prefs(DateFlexibility::SpecificDate, 1, Some(-1))
            .validate()
            .unwrap_err();
        let input = err.downcast_ref::<InvalidInputError>().unwrap();
        assert_eq!(input.field, "days_until_wedding");
    }

    #[test]
    fn duration_outside_window_is_rejected() {
        for duration in [0u32, 15, 100] {
            let err = prefs(DateFlexibility::Within3Months, duration, None)
                .validate()
                .unwrap_err();
            let input = err.downcast_ref::<InvalidInputError>().unwrap();
            assert_eq!(input.field, "duration_days");
        }
    }

    #[test]
    fn flexibility_parses_wire_names() {
        assert_eq!(
            "within_12_months".parse::<DateFlexibility>().unwrap(),
            DateFlexibility::Within12Months
        );
        assert!("sometime_next_year".parse::<DateFlexibility>().is_err());
    }

    #[test]
    fn serde_uses_snake_case_wire_names() {
        let p = prefs(DateFlexibility::SpecificDate, 2, Some(45));
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["flexibility"], "specific_date");
        assert_eq!(json["days_until_wedding"], 45);
    }
}
