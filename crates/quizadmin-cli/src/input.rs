//! Console input.
//!
//! Commands and prompt answers come from one buffered reader, so answers
//! typed (or piped) after a command are never mistaken for the next command.

use std::io::{self, Write};

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

pub struct Input<R> {
    lines: Lines<R>,
    /// Read passwords from the terminal without echo
    hide_passwords: bool,
}

impl<R: AsyncBufRead + Unpin> Input<R> {
    pub fn new(reader: R, hide_passwords: bool) -> Self {
        Self {
            lines: reader.lines(),
            hide_passwords,
        }
    }

    /// Next raw line, or `None` at end of input. Cancel safe.
    pub async fn next_line(&mut self) -> Result<Option<String>> {
        Ok(self.lines.next_line().await?)
    }

    /// Show `label` and read the answer. End of input answers with "".
    pub async fn ask(&mut self, label: &str) -> Result<String> {
        print!("{}", label);
        io::stdout().flush()?;
        let answer = self.next_line().await?.unwrap_or_default();
        Ok(answer.trim().to_string())
    }

    pub async fn ask_password(&mut self, label: &str) -> Result<String> {
        if self.hide_passwords {
            return Ok(rpassword::prompt_password(label)?);
        }
        self.ask(label).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_answers_and_commands_share_one_stream() {
        let mut input = Input::new(&b"login\n  ada@example.com \nsecret\nquit\n"[..], false);

        assert_eq!(input.next_line().await.expect("read").as_deref(), Some("login"));
        assert_eq!(input.ask("Email: ").await.expect("read"), "ada@example.com");
        assert_eq!(input.ask_password("Password: ").await.expect("read"), "secret");
        assert_eq!(input.next_line().await.expect("read").as_deref(), Some("quit"));
        assert_eq!(input.next_line().await.expect("read"), None);
    }

    #[tokio::test]
    async fn test_end_of_input_answers_empty() {
        let mut input = Input::new(&b""[..], false);
        assert_eq!(input.ask("Email: ").await.expect("read"), "");
    }
}
