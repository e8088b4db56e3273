use minidex_core::{Address, DexEvent, EventLog, Hash};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

/// WebSocket event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum WsEvent {
    TxApplied {
        hash: String,
        sender: Address,
        call: String,
        success: bool,
    },
    ContractEvent {
        emitter: Address,
        event: DexEvent,
    },
}

impl WsEvent {
    pub fn tx_applied(hash: Hash, sender: Address, call: &str, success: bool) -> Self {
        WsEvent::TxApplied {
            hash: hash.to_hex(),
            sender,
            call: call.to_string(),
            success,
        }
    }

    pub fn from_event_log(log: &EventLog) -> Self {
        WsEvent::ContractEvent {
            emitter: log.emitter,
            event: log.event.clone(),
        }
    }
}

/// Filter a client sends as a text frame: `{"emitter": "0x.."}` narrows
/// contract events to one contract, `{}` clears it. Transaction
/// notifications are always delivered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Subscription {
    #[serde(default)]
    pub emitter: Option<Address>,
}

impl Subscription {
    pub fn accepts(&self, event: &WsEvent) -> bool {
        match (self.emitter, event) {
            (Some(wanted), WsEvent::ContractEvent { emitter, .. }) => *emitter == wanted,
            _ => true,
        }
    }
}

/// Event broadcaster for WebSocket clients
pub struct EventBroadcaster {
    sender: broadcast::Sender<WsEvent>,
}

impl EventBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        EventBroadcaster { sender }
    }

    /// Broadcast an event to all connected clients
    pub fn broadcast(&self, event: WsEvent) {
        // Sending only fails when nobody is listening.
        if let Ok(count) = self.sender.send(event) {
            debug!("Broadcast event to {} clients", count);
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WsEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_broadcast() {
        let broadcaster = EventBroadcaster::new(100);
        let mut rx = broadcaster.subscribe();

        let sender = Address([1; 20]);
        broadcaster.broadcast(WsEvent::tx_applied(Hash::ZERO, sender, "swap", true));

        match rx.recv().await.unwrap() {
            WsEvent::TxApplied { call, success, .. } => {
                assert_eq!(call, "swap");
                assert!(success);
            }
            _ => panic!("Wrong event type"),
        }
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let broadcaster = EventBroadcaster::new(100);
        let mut rx1 = broadcaster.subscribe();
        let mut rx2 = broadcaster.subscribe();

        assert_eq!(broadcaster.subscriber_count(), 2);

        let log = EventLog::new(
            Address([3; 20]),
            DexEvent::Swapped {
                token_in: Address([1; 20]),
                token_out: Address([2; 20]),
                amount_in: 10,
                amount_out: 9,
            },
        );
        broadcaster.broadcast(WsEvent::from_event_log(&log));

        rx1.recv().await.unwrap();
        rx2.recv().await.unwrap();
    }

    #[test]
    fn test_subscription_filters_contract_events() {
        let dex = Address([3; 20]);
        let other = EventLog::new(
            Address([4; 20]),
            DexEvent::Approval {
                owner: Address([1; 20]),
                spender: dex,
                amount: 5,
            },
        );
        let swapped = EventLog::new(
            dex,
            DexEvent::Swapped {
                token_in: Address([1; 20]),
                token_out: Address([2; 20]),
                amount_in: 10,
                amount_out: 9,
            },
        );
        let filter = format!(r#"{{"emitter":"{}"}}"#, dex);
        let sub: Subscription = serde_json::from_str(&filter).unwrap();

        assert!(sub.accepts(&WsEvent::from_event_log(&swapped)));
        assert!(!sub.accepts(&WsEvent::from_event_log(&other)));
        assert!(sub.accepts(&WsEvent::tx_applied(Hash::ZERO, dex, "swap", false)));

        let cleared: Subscription = serde_json::from_str("{}").unwrap();
        assert!(cleared.accepts(&WsEvent::from_event_log(&other)));
    }

    #[test]
    fn test_event_json_shape() {
        let log = EventLog::new(
            Address([3; 20]),
            DexEvent::Transfer {
                from: Address([1; 20]),
                to: Address([2; 20]),
                amount: 10_000_000_000_000_000_000_000,
            },
        );
        let json = serde_json::to_value(WsEvent::from_event_log(&log)).unwrap();

        assert_eq!(json["type"], "ContractEvent");
        assert_eq!(
            json["data"]["event"]["Transfer"]["amount"],
            "10000000000000000000000"
        );
    }
}
