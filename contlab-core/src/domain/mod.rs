//! Domain types for contlab

pub mod bar;
pub mod continuous;
pub mod contract;
pub mod ids;

pub use bar::{date_from_yyyymmdd, date_to_yyyymmdd, Bar, BarError, BarKind, Interval};
pub use continuous::{
    AdjustmentAnchor, AdjustmentEntry, AdjustmentTable, ContinuousBar, RollEvent, RollReason,
};
pub use contract::{ContractSeries, ContractSpec, DeliveryMonth};
pub use ids::{ContractId, ProductId, SeriesFingerprint};
