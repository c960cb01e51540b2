//! End-to-end tests against a scripted UCI engine process

#![cfg(unix)]

mod common;

use std::io::Write;
use std::time::Duration;

use bridge::{external_factory, Bridge, BridgeError, MoveOrigin};
use common::*;
use engine::ExternalConfig;

const FAKE_ENGINE: &str = r#"
while read -r line; do
  case "$line" in
    uci)
      echo "id name ScriptFish"
      echo "option name Hash type spin default 16 min 1 max 1024"
      echo "option name UCI_Variant type combo default chess var chess var xiangqi"
      echo "uciok" ;;
    isready) echo "readyok" ;;
    "position fen 7k/6Q1/6K1/8/8/8/8/8 b - - 0 1") mated=1 ;;
    position*) mated=0 ;;
    go*)
      if [ "$mated" = "1" ]; then
        echo "bestmove (none)"
      else
        echo "info depth 1 score cp 10 pv g1f3"
        echo "bestmove g1f3"
      fi ;;
    quit) exit 0 ;;
  esac
done
"#;

fn scripted_bridge() -> (Bridge, tempfile::NamedTempFile) {
    let mut script = tempfile::NamedTempFile::new().unwrap();
    script.write_all(FAKE_ENGINE.as_bytes()).unwrap();
    script.flush().unwrap();

    let mut config = ExternalConfig::new("/bin/sh");
    config.args = vec![script.path().display().to_string()];
    config.handshake_timeout = Duration::from_secs(5);
    (Bridge::new(test_config(), external_factory(config)), script)
}

#[test]
fn best_move_comes_from_engine_process() {
    let (bridge, _script) = scripted_bridge();
    bridge.set_position_with_moves(START_FEN, "e2e4 e7e5").unwrap();

    let best = bridge.request_best_move(100);
    assert_eq!(best.as_str(), "g1f3");
    assert_eq!(best.origin(), MoveOrigin::Engine);
    bridge.shutdown();
}

#[test]
fn bestmove_none_becomes_fallback() {
    let (bridge, _script) = scripted_bridge();
    bridge.set_position(MATED_FEN).unwrap();

    let best = bridge.request_best_move(100);
    assert_eq!(best.as_str(), "e2e4");
    assert_eq!(best.origin(), MoveOrigin::NoRootMoves);
    bridge.shutdown();
}

#[test]
fn engine_variants_are_available() {
    let (bridge, _script) = scripted_bridge();
    bridge.initialize(Some("xiangqi")).unwrap();
    assert_eq!(bridge.variant().as_deref(), Some("xiangqi"));

    bridge.configure_option("UCI_Variant", "shogi").unwrap();
    assert!(matches!(
        bridge.sync(Duration::from_secs(5)),
        Err(BridgeError::UnknownVariant(v)) if v == "shogi"
    ));
    bridge.shutdown();
}

#[test]
fn missing_binary_fails_initialization() {
    let config = ExternalConfig::new("/nonexistent/engine-binary");
    let bridge = Bridge::new(test_config(), external_factory(config));

    assert!(matches!(bridge.initialize(None), Err(BridgeError::Engine(_))));
    assert_eq!(bridge.request_best_move(50).origin(), MoveOrigin::EngineError);
}
