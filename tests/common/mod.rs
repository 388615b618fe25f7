//! Spawns routers on ephemeral ports for the blocking client to talk to.

#![allow(dead_code)]

use axum::Router;
use cryptoservice::server;
use std::thread;

/// Serves `app` on its own thread and runtime, returning the base URL.
///
/// The listener is bound before this returns, so requests made right away
/// wait in the accept backlog instead of being refused.
pub fn spawn_app(app: Router) -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let addr = listener.local_addr().unwrap();

    thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async move {
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            axum::serve(listener, app)
                .await
                .unwrap_or_else(|e| eprintln!("Server error: {}", e));
        });
    });

    format!("http://{}", addr)
}

/// Spawns the reference service
pub fn spawn_server() -> String {
    spawn_app(server::router())
}

/// An address nothing is listening on
pub fn closed_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
