pub mod remote;
pub mod simulated;
pub mod traits;

pub use simulated::{SimulatedBroker, SimulatedFeed};
pub use traits::{
    BrokerError, BrokerGateway, MarketDataError, MarketDataProvider, OrderFill, OrderRequest,
};
