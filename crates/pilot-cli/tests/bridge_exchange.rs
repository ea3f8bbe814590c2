//! Exercises the client against a real bridge over TCP.

use std::ffi::OsString;
use std::process::ExitCode;
use std::time::Duration;

use rstest::{fixture, rstest};
use serde_json::json;

use pilot_cli::{PilotCommand, exchange};
use pilot_config::{Config, TcpEndpoint};
use pilot_engine::ScriptedEngine;
use pilotd::Bridge;

struct RunningBridge {
    bridge: Bridge,
    endpoint: TcpEndpoint,
}

#[fixture]
fn running_bridge() -> RunningBridge {
    let mut engine = ScriptedEngine::new("Forge the Kingdom");
    engine
        .define_label("start")
        .show_line(Some("merith"), "The gateway stirs.")
        .present_menu(["Raise the gateway", "Wait"])
        .seed_variable("chapter", json!(3));

    let mut config = Config::default();
    config.endpoint = TcpEndpoint::new("127.0.0.1", 0);
    config.state_variables = vec!["chapter".to_owned()];

    let mut bridge = Bridge::new(config, Box::new(engine)).expect("bridge");
    bridge.start().expect("start bridge");
    let addr = bridge.local_addr().expect("bound address");
    let endpoint = TcpEndpoint::new("127.0.0.1", addr.port());
    RunningBridge { bridge, endpoint }
}

const TIMEOUT: Duration = Duration::from_secs(5);

#[rstest]
fn ping_round_trips(running_bridge: RunningBridge) {
    let request = PilotCommand::Ping.to_request();
    let reply = exchange(&running_bridge.endpoint, TIMEOUT, &request).expect("exchange");
    assert_eq!(reply["ok"], json!(true));
    assert_eq!(reply["game"], json!("Forge the Kingdom"));

    running_bridge.bridge.shutdown();
}

#[rstest]
fn choose_and_variables_travel_intact(running_bridge: RunningBridge) {
    let chosen = exchange(
        &running_bridge.endpoint,
        TIMEOUT,
        &PilotCommand::Choose { index: 1 }.to_request(),
    )
    .expect("choose");
    assert_eq!(chosen, json!({"ok": true, "chosen": 1}));

    let variables = exchange(
        &running_bridge.endpoint,
        TIMEOUT,
        &PilotCommand::Variables {
            names: vec!["chapter".to_owned(), "missing".to_owned()],
        }
        .to_request(),
    )
    .expect("variables");
    assert_eq!(variables["variables"]["chapter"], json!(3));
    assert_eq!(variables["variables"]["missing"], json!(null));

    running_bridge.bridge.shutdown();
}

#[rstest]
fn run_prints_the_reply_and_mirrors_the_verdict(running_bridge: RunningBridge) {
    let endpoint = running_bridge.endpoint.to_string();
    let args = ["pilot", "--endpoint", &endpoint, "jump", "nowhere"];

    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let code = pilot_cli::run(args.iter().copied().map(OsString::from), &mut stdout, &mut stderr);

    assert_eq!(code, ExitCode::FAILURE);
    let printed: serde_json::Value =
        serde_json::from_slice(&stdout).expect("stdout holds the reply line");
    assert_eq!(printed["error"], json!("Label 'nowhere' not found"));

    running_bridge.bridge.shutdown();
}
