//! Incremental SAT-based equivalence sweeping over an and-inverter
//! graph: probes name literals of interest, conditions scope the
//! assumptions a query runs under, and `Session` ties the AIG, the
//! incremental solver and the CNF translation together.

pub mod aig;
pub mod cnf;
pub mod cond;
pub mod equiv;
pub mod error;
pub mod extract;
pub mod lit;
pub mod probe;
pub mod sat;
pub mod session;

pub use aig::Aig;
pub use equiv::{EquivStats, EquivStatus};
pub use error::{Result, SweeperError};
pub use lit::Lit;
pub use sat::SatResult;
pub use session::{Session, SessionConfig};
