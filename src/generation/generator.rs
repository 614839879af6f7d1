//! The generative-text collaborator.
//!
//! The model is a black box: it receives a system instruction and a user
//! prompt and returns one string, or fails. It is called at most once per
//! request and never retried.

use anyhow::{bail, Context};
use serde::Serialize;
use std::io::{self, Write};
use std::process::{Command, Stdio};
use std::thread;

pub trait TextGenerator {
    fn generate(&self, system: &str, prompt: &str) -> anyhow::Result<String>;
}

impl<F> TextGenerator for F
where
    F: Fn(&str, &str) -> anyhow::Result<String>,
{
    fn generate(&self, system: &str, prompt: &str) -> anyhow::Result<String> {
        self(system, prompt)
    }
}

#[derive(Serialize)]
struct GeneratorInput<'a> {
    system: &'a str,
    prompt: &'a str,
}

/// Runs an external program that reads `{"system": .., "prompt": ..}` on
/// stdin and prints the model response on stdout.
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    program: String,
    args: Vec<String>,
}

impl CommandGenerator {
    pub fn new<S: Into<String>>(program: S) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// `argv[0]` is the program, the rest are its arguments.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        if program.trim().is_empty() {
            return None;
        }
        Some(Self::new(program.clone()).with_args(args.iter().cloned()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl TextGenerator for CommandGenerator {
    fn generate(&self, system: &str, prompt: &str) -> anyhow::Result<String> {
        let payload = serde_json::to_vec(&GeneratorInput { system, prompt })
            .context("failed to encode generator input")?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to start generator '{}'", self.program))?;

        // Feed stdin from its own thread while stdout and stderr drain.
        let stdin = child.stdin.take();
        let (sent, output) = thread::scope(|scope| {
            let writer = scope.spawn(move || -> io::Result<()> {
                match stdin {
                    Some(mut stdin) => stdin.write_all(&payload),
                    None => Ok(()),
                }
            });
            let output = child.wait_with_output();
            (writer.join(), output)
        });

        let output = output.context("failed to read generator output")?;

        match sent {
            Ok(Ok(())) => {}
            // A generator may exit without reading its input; its exit status decides.
            Ok(Err(e)) if e.kind() == io::ErrorKind::BrokenPipe => {}
            Ok(Err(e)) => return Err(e).context("failed to send prompt to generator"),
            Err(_) => bail!("generator input thread panicked"),
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "generator '{}' exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            );
        }

        String::from_utf8(output.stdout).context("generator output is not valid UTF-8")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_generator() {
        let generator = |system: &str, prompt: &str| -> anyhow::Result<String> {
            Ok(format!("{}|{}", system, prompt))
        };
        assert_eq!(generator.generate("sys", "user").unwrap(), "sys|user");
    }

    #[test]
    fn test_from_argv() {
        assert!(CommandGenerator::from_argv(&[]).is_none());
        assert!(CommandGenerator::from_argv(&[" ".to_string()]).is_none());

        let generator =
            CommandGenerator::from_argv(&["model-cli".to_string(), "--fast".to_string()]).unwrap();
        assert_eq!(generator.program(), "model-cli");
        assert_eq!(generator.args, vec!["--fast"]);
    }

    #[test]
    fn test_missing_program_fails() {
        let generator = CommandGenerator::new("gameforge-no-such-generator-binary");
        let error = generator.generate("sys", "prompt").unwrap_err();
        assert!(error.to_string().contains("failed to start generator"));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_generator_round_trip() {
        let generator = CommandGenerator::new("sh").with_args([
            "-c",
            "cat > /dev/null; printf '%s\\n%s\\n%s\\n%s' '--- HTML ---' '<p>ok</p>' '--- INSTRUCTIONS ---' play",
        ]);
        let response = generator.generate("sys", "prompt").unwrap();
        assert_eq!(response, "--- HTML ---\n<p>ok</p>\n--- INSTRUCTIONS ---\nplay");
    }

    #[cfg(unix)]
    #[test]
    fn test_command_generator_receives_json() {
        let generator = CommandGenerator::new("cat");
        let echoed = generator.generate("be brief", "pong").unwrap();
        let value: serde_json::Value = serde_json::from_str(&echoed).unwrap();
        assert_eq!(value["system"], "be brief");
        assert_eq!(value["prompt"], "pong");
    }

    #[cfg(unix)]
    #[test]
    fn test_large_prompt_is_echoed_without_stalling() {
        // Well past a pipe buffer in both directions.
        let prompt = "x".repeat(512 * 1024);
        let generator = CommandGenerator::new("cat");

        let echoed = generator.generate("sys", &prompt).unwrap();
        let value: serde_json::Value = serde_json::from_str(&echoed).unwrap();
        assert_eq!(value["prompt"].as_str().unwrap().len(), prompt.len());
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_is_failure() {
        let generator = CommandGenerator::new("sh").with_args(["-c", "cat > /dev/null; echo quota exceeded >&2; exit 3"]);
        let error = generator.generate("sys", "prompt").unwrap_err();
        assert!(error.to_string().contains("quota exceeded"));
    }
}
