//! Common test fixtures.
//!
//! Pre-defined values for the scenarios exercised across the workspace.

/// Geographic regions as ((lat, lon) lower, (lat, lon) upper).
pub mod geo {
    /// Whole 0.25 degree grid
    pub const GLOBAL: ((f64, f64), (f64, f64)) = ((-60.0, -180.0), (90.0, 180.0));

    /// Mid-Atlantic US, Washington DC to New York
    pub const MID_ATLANTIC: ((f64, f64), (f64, f64)) = ((38.9, -77.0), (40.7, -74.0));

    /// Grid indices of `MID_ATLANTIC` as (lat, lon) lower and upper
    pub const MID_ATLANTIC_INDICES: ((i64, i64), (i64, i64)) = ((395, 412), (402, 424));
}

/// Date ranges as (start, end).
pub mod dates {
    pub const SINGLE_DAY: (&str, &str) = ("1982-11-28", "1982-11-29");

    /// Days from 1950-01-01 to the start of `SINGLE_DAY`
    pub const SINGLE_DAY_START_DAYS: u16 = 12_019;

    /// Packed version of `SINGLE_DAY`
    pub const SINGLE_DAY_VERSION: u32 = 787_677_185;

    pub const INVERTED: (&str, &str) = ("2000-01-02", "2000-01-01");
}

/// Object names and namespaces.
pub mod names {
    pub const TAS_ACCESS: &str = "v:tas,m:ACCESS-ESM1-5";
    pub const HUSS_ACCESS: &str = "v:huss,m:ACCESS-ESM1-5";
    pub const LOCAL_PRESSURE: &str = "v:pressure,m:mymodel";
    pub const CATALOG_NAMESPACE: &str = "cmip6-planetary";
}
