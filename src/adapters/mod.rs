//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter         | Implements      | Connects to              |
//! |-----------------|-----------------|--------------------------|
//! | `file_store`    | StorePort       | Flat line files on disk  |
//! | `clock`         | ClockPort       | Host civil time          |
//! | `log_transport` | TransportPort   | Serial log output        |

pub mod clock;
pub mod file_store;
pub mod log_transport;
