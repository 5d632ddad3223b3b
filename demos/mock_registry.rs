//! demos/mock_registry.rs
//! Run: cargo run --example mock_registry -- [port]
//!
//! Serves a fake `/v1/agent/checks` listing so consulate can be tried
//! without a Consul agent. Point it at this process with
//! `CONSULATE__SERVER__CONSUL_ADDRESS=127.0.0.1:8500`.

use hyper::{
    service::{make_service_fn, service_fn},
    Body, Request, Response, Server, StatusCode,
};
use rand::Rng;
use serde_json::{json, Value};
use std::{
    convert::Infallible,
    net::SocketAddr,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::{sync::RwLock, time::sleep};

const STATUSES: [&str; 3] = ["passing", "warning", "critical"];

#[derive(Clone)]
struct RegistryState {
    req_counter: Arc<AtomicU64>,
    checks: Arc<RwLock<Vec<MockCheck>>>,
    flap_pct: f64,
}

#[derive(Clone)]
struct MockCheck {
    check_id: &'static str,
    name: &'static str,
    service_id: &'static str,
    service_name: &'static str,
    status: &'static str,
}

impl MockCheck {
    fn to_json(&self) -> Value {
        json!({
            "Node": "mock-node",
            "CheckID": self.check_id,
            "Name": self.name,
            "Status": self.status,
            "Notes": "",
            "Output": format!("{} is {}", self.name, self.status),
            "ServiceID": self.service_id,
            "ServiceName": self.service_name,
            "ServiceTags": ["demo"],
            "Type": "http",
            "CreateIndex": 0,
            "ModifyIndex": 0
        })
    }
}

fn seed_checks() -> Vec<MockCheck> {
    let check = |check_id, name, service_id, service_name, status| MockCheck {
        check_id,
        name,
        service_id,
        service_name,
        status,
    };

    vec![
        check("service:web-1", "web http", "web-1", "web", "passing"),
        check("service:web-2", "web http", "web-2", "web", "passing"),
        check("service:api-1", "api http", "api-1", "api", "passing"),
        check("service:api-1:tcp", "api tcp", "api-1", "api", "warning"),
        check("service:db-1", "db tcp", "db-1", "db", "passing"),
    ]
}

async fn handle(req: Request<Body>, state: RegistryState) -> Result<Response<Body>, Infallible> {
    let n = state.req_counter.fetch_add(1, Ordering::SeqCst) + 1;
    let path = req.uri().path().to_owned();

    if path != "/v1/agent/checks" {
        let mut response = Response::new(Body::from("404 page not found"));
        *response.status_mut() = StatusCode::NOT_FOUND;
        return Ok(response);
    }

    let body: serde_json::Map<String, Value> = state
        .checks
        .read()
        .await
        .iter()
        .map(|check| (check.check_id.to_string(), check.to_json()))
        .collect();

    println!("[registry] request #{} served {} checks", n, body.len());

    let mut response = Response::new(Body::from(Value::Object(body).to_string()));
    response.headers_mut().insert(
        hyper::header::CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("application/json"),
    );
    Ok(response)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let port: u16 = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "8500".into())
        .parse()?;

    let flap_pct = std::env::var("FLAP_PCT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(20.0);

    let state = RegistryState {
        req_counter: Arc::new(AtomicU64::new(0)),
        checks: Arc::new(RwLock::new(seed_checks())),
        flap_pct,
    };

    // Flip a random check's status every 10 s
    {
        let st = state.clone();
        tokio::spawn(async move {
            loop {
                sleep(Duration::from_secs(10)).await;
                if st.flap_pct <= 0.0 {
                    continue;
                }

                let mut checks = st.checks.write().await;
                let mut rng = rand::thread_rng();
                for check in checks.iter_mut() {
                    if rng.gen_bool((st.flap_pct / 100.0).min(1.0)) {
                        let next = STATUSES[rng.gen_range(0..STATUSES.len())];
                        if next != check.status {
                            println!("[registry] {} flipped {} -> {}", check.check_id, check.status, next);
                            check.status = next;
                        }
                    }
                }
            }
        });
    }

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let make_svc = make_service_fn(move |_conn| {
        let st = state.clone();
        async move { Ok::<_, Infallible>(service_fn(move |req| handle(req, st.clone()))) }
    });

    println!("Mock registry on http://{}/v1/agent/checks  [flap={} %]", addr, flap_pct);

    Server::bind(&addr).serve(make_svc).await?;
    Ok(())
}
