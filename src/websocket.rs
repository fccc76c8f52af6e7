use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use tungstenite::{accept, Message};

use crate::monitor::MonitorSnapshot;

/// Serves the latest snapshot as JSON to every connected dashboard client.
/// Purely outbound; nothing received here feeds back into the control loop.
pub fn websocket_thread(bind: String, shared: Arc<Mutex<MonitorSnapshot>>) {
    let server = match TcpListener::bind(&bind) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Dashboard feed failed to bind {}: {}", bind, e);
            return;
        }
    };
    println!("Dashboard feed listening on {}", bind);

    for stream in server.incoming() {
        let stream = match stream {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Connection error: {}", e);
                continue;
            }
        };

        let shared = Arc::clone(&shared);
        thread::spawn(move || {
            let mut websocket = match accept(stream) {
                Ok(ws) => ws,
                Err(e) => {
                    eprintln!("WebSocket handshake error: {}", e);
                    return;
                }
            };

            println!("Dashboard client connected");

            loop {
                let snapshot = {
                    let locked = shared.lock().unwrap();
                    locked.clone()
                };

                match serde_json::to_string(&snapshot) {
                    Ok(json) => {
                        if websocket.send(Message::Text(json)).is_err() {
                            println!("Dashboard client disconnected");
                            break;
                        }
                    }
                    Err(e) => eprintln!("JSON serialization error: {}", e),
                }

                thread::sleep(Duration::from_millis(200));
            }
        });
    }
}
