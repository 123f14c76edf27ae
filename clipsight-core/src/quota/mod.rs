pub mod decision;
pub mod identity;
pub mod period;
pub mod tier;
