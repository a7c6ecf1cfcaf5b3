mod ability;
mod api_result;
pub mod client;
mod discoverer;
mod domain;
mod event_channel;
mod pairing;
pub mod resources;

pub use ability::{Ability, DeviceClass};
pub use api_result::{ApiResult, LOCAL_FAILURE_CODE, ResultData};
pub use client::{ApiClient, ApiRequest, ClientError};
pub use discoverer::{DiscoverError, DiscoveryResponse, GatewayDiscoveryInfo, discover};
pub use domain::*;
pub use event_channel::{
    ChannelMessage, EventChannel, EventChannelError, EventSender, EventSource, EventSubscriber, GatewayEvent, Topic, dispatch,
};
pub use pairing::{PairingError, acquire_credential, verify_credential};
