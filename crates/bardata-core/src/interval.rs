use std::fmt;
use std::str::FromStr;

/// Bar sampling granularity, using the provider's short codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interval {
    OneMinute,
    FiveMinute,
    FifteenMinute,
    OneHour,
    OneDay,
}

impl Interval {
    /// Short code as used in request parameters and file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::OneMinute => "1m",
            Interval::FiveMinute => "5m",
            Interval::FifteenMinute => "15m",
            Interval::OneHour => "1h",
            Interval::OneDay => "1d",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1m" => Ok(Interval::OneMinute),
            "5m" => Ok(Interval::FiveMinute),
            "15m" => Ok(Interval::FifteenMinute),
            "1h" => Ok(Interval::OneHour),
            "1d" => Ok(Interval::OneDay),
            other => Err(format!(
                "unknown interval: {other}. Expected: 1m, 5m, 15m, 1h, 1d"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_roundtrips_through_from_str() {
        for interval in [
            Interval::OneMinute,
            Interval::FiveMinute,
            Interval::FifteenMinute,
            Interval::OneHour,
            Interval::OneDay,
        ] {
            assert_eq!(interval.to_string().parse::<Interval>(), Ok(interval));
        }
    }

    #[test]
    fn from_str_rejects_unknown_code() {
        assert!("2h".parse::<Interval>().is_err());
    }
}
