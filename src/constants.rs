use uuid::Uuid;

/// Narrowest admissible doorway, metres.
pub const MIN_WIDTH: f64 = 0.5;

/// Density below which a zone counts as nearly empty, persons/m².
pub const MIN_DENSITY: f64 = 0.1;

/// Hard cap on zone density, persons/m².
pub const MAX_DENSITY: f64 = 5.0;

/// Duration of one simulation tick, minutes.
pub const MODELLING_STEP: f64 = 0.008;

/// Default horizontal projection area of one person, m².
pub const PROJECTION_AREA: f64 = 0.1;

/// Decimal places kept when rounding computed geometry.
pub const NDIGITS: usize = 15;

/// Reserved identifier of the synthetic safety zone.
pub const SAFETY_ZONE_ID: Uuid = Uuid::from_u128(0xe6315dac_ad4b_11ed_9732_d36b774c66a1);

/// People left in the building below which a run counts as evacuated.
pub const EVACUATED_THRESHOLD: f64 = 1e-2;

/// Safety cap on ticks for [`Moving::run`](crate::moving::Moving::run).
pub const MAX_MODELLING_TICKS: u32 = 10_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safety_zone_id_matches_reserved_uuid() {
        assert_eq!(
            SAFETY_ZONE_ID,
            Uuid::parse_str("e6315dac-ad4b-11ed-9732-d36b774c66a1").unwrap()
        );
    }
}
