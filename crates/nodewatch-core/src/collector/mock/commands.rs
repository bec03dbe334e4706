//! Canned command output for testing collectors without spawning processes.

use std::collections::HashMap;
use std::io;

use crate::collector::traits::CommandRunner;

/// Command runner that answers from a table of `program args...` → output.
///
/// Commands not in the table fail with `NotFound`, as if the program were
/// not installed.
#[derive(Debug, Clone, Default)]
pub struct MockCommands {
    outputs: HashMap<String, Result<String, io::ErrorKind>>,
}

fn command_key(program: &str, args: &[&str]) -> String {
    let mut key = program.to_string();
    for arg in args {
        key.push(' ');
        key.push_str(arg);
    }
    key
}

impl MockCommands {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the stdout of a successful invocation.
    pub fn add_output(&mut self, program: &str, args: &[&str], stdout: impl Into<String>) {
        self.outputs
            .insert(command_key(program, args), Ok(stdout.into()));
    }

    /// Registers an invocation that fails with the given error kind
    /// (`TimedOut` to simulate a hung command).
    pub fn add_failure(&mut self, program: &str, args: &[&str], kind: io::ErrorKind) {
        self.outputs.insert(command_key(program, args), Err(kind));
    }
}

impl CommandRunner for MockCommands {
    fn run(&self, program: &str, args: &[&str]) -> io::Result<String> {
        let key = command_key(program, args);
        match self.outputs.get(&key) {
            Some(Ok(stdout)) => Ok(stdout.clone()),
            Some(Err(kind)) => Err(io::Error::new(*kind, format!("mock failure: {key}"))),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("command not found: {key}"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_commands_output() {
        let mut cmds = MockCommands::new();
        cmds.add_output("df", &["-H"], "Filesystem\n");
        assert_eq!(cmds.run("df", &["-H"]).unwrap(), "Filesystem\n");
        assert_eq!(
            cmds.run("df", &[]).unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
    }

    #[test]
    fn test_mock_commands_failure() {
        let mut cmds = MockCommands::new();
        cmds.add_failure("journalctl", &["--list-boots"], io::ErrorKind::TimedOut);
        let err = cmds.run("journalctl", &["--list-boots"]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }
}
