//! Signals sent to this process while a child runs. Kept in its own test
//! binary because the pending-signal slot is process-wide.

use arthur_ops::command::{CommandRunner, Invocation, SystemRunner};
use arthur_ops::signals;

fn signal_parent(name: &str) -> Invocation {
    Invocation::new("sh").args(["-c", &format!("kill -{} $PPID; sleep 0.2", name)])
}

#[test]
fn signals_during_child_commands_become_interrupted() {
    signals::install().unwrap();

    let err = SystemRunner.output(&signal_parent("TERM")).unwrap_err();
    assert_eq!(err.code.as_str(), "interrupted");
    assert_eq!(err.details["signal"], 15);
    assert_eq!(err.code.exit_code(), 130);

    let err = SystemRunner.interactive(&signal_parent("INT")).unwrap_err();
    assert_eq!(err.details["signal"], 2);

    let err = SystemRunner.output(&signal_parent("HUP")).unwrap_err();
    assert_eq!(err.details["signal"], 1);

    let output = SystemRunner.output(&Invocation::new("true")).unwrap();
    assert!(output.success());
}
