/// A parsed client input line.
///
/// Lines starting with `/` are commands; anything else is a message for the
/// joined topic. A leading `\` escapes a payload that should itself start
/// with `/` or `\`.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Login { username: String, password: String },
    Join { topic: String },
    Users,
    Leave,
    Publish { payload: String },
    Unknown { name: String },
    Malformed { usage: &'static str },
}

impl Command {
    pub fn parse(line: &str) -> Command {
        if let Some(rest) = line.strip_prefix('/') {
            let mut parts = rest.split_whitespace();
            let name = parts.next().unwrap_or_default();
            let args: Vec<&str> = parts.collect();
            return match name {
                "login" => match args.as_slice() {
                    [username, password] => Command::Login {
                        username: username.to_string(),
                        password: password.to_string(),
                    },
                    _ => Command::Malformed {
                        usage: "/login command needs 2 arguments {login} {password}",
                    },
                },
                "join" => match args.as_slice() {
                    [topic] => Command::Join {
                        topic: topic.to_string(),
                    },
                    _ => Command::Malformed {
                        usage: "/join command needs 1 argument {topic}",
                    },
                },
                "users" => Command::Users,
                "leave" => Command::Leave,
                other => Command::Unknown {
                    name: format!("/{other}"),
                },
            };
        }
        let payload = line.strip_prefix('\\').unwrap_or(line);
        Command::Publish {
            payload: payload.to_string(),
        }
    }
}
