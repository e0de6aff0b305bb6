//! Business services.

pub mod settlement;

pub use settlement::{
    CartLine, SettledOrder, SettlementError, SettlementQuery, SettlementRequest, SettlementService,
};
