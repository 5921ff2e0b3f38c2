//! Arrival order is preserved from the wire to the consumer.

use proptest::prelude::*;
use tvremote_client::{
    ReceiveExit, TransportError, dispatch_queue, run_receive_loop, transport::memory,
};

/// One inbound frame: well-formed with a distinct id, or garbage.
fn frames() -> impl Strategy<Value = Vec<Option<u16>>> {
    prop::collection::vec(prop::option::weighted(0.8, any::<u16>()), 0..40)
}

fn frame(seq: usize, id: Option<u16>) -> String {
    match id {
        Some(id) => format!(r#"{{"type":"response","id":"{seq}_{id}","payload":{{"n":{seq}}}}}"#),
        None => format!("garbage frame {seq}"),
    }
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap()
}

proptest! {
    #[test]
    fn inbox_yields_frames_in_wire_order(ids in frames(), slow_consumer in any::<bool>()) {
        let rt = runtime();
        let observed = rt.block_on(async {
            let (_sink, source, device) = memory::pair();
            let (dispatcher, mut inbox) = dispatch_queue();
            let receiver = tokio::spawn(run_receive_loop(source, dispatcher));

            for (seq, id) in ids.iter().enumerate() {
                device.push(frame(seq, *id)).unwrap();
            }
            device.hang_up().unwrap();

            let mut observed = Vec::new();
            loop {
                if slow_consumer {
                    tokio::task::yield_now().await;
                }
                match inbox.next().await {
                    Ok(message) => observed.push(message.id),
                    Err(e) => {
                        assert_eq!(e, TransportError::Closed);
                        break;
                    },
                }
            }
            assert_eq!(receiver.await.unwrap(), ReceiveExit::Closed);
            observed
        });

        let expected: Vec<String> = ids
            .iter()
            .enumerate()
            .map(|(seq, id)| id.map(|id| format!("{seq}_{id}")).unwrap_or_default())
            .collect();
        prop_assert_eq!(observed, expected);
    }
}
