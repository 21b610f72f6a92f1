/// Attestation timestamp.
///
/// Internally i64 microseconds from unix epoch.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Construct a new timestamp of "now".
    pub fn now() -> Self {
        std::time::SystemTime::now().into()
    }
}

impl From<std::time::SystemTime> for Timestamp {
    fn from(t: std::time::SystemTime) -> Self {
        Self(
            t.duration_since(std::time::SystemTime::UNIX_EPOCH)
                .expect("invalid system time")
                .as_micros() as i64,
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn now_is_monotonic_enough() {
        let a = Timestamp::now();
        let b = Timestamp::now();
        assert!(a <= b);
        assert!(a.0 > 0);
    }

    #[test]
    fn serializes_as_micros() {
        let t = Timestamp::from(
            std::time::SystemTime::UNIX_EPOCH
                + std::time::Duration::from_millis(42),
        );
        assert_eq!("42000", serde_json::to_string(&t).unwrap());
        assert_eq!(t, serde_json::from_str::<Timestamp>("42000").unwrap());
    }
}
