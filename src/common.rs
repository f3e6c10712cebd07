// Platform member ids look like `<member>_<session>`; only the prefix is stable
pub const MEMBER_KEY_SEPARATOR: char = '_';

pub fn member_key(raw: &str) -> &str {
    raw.split(MEMBER_KEY_SEPARATOR).next().unwrap_or(raw)
}

// basic CLI tool for checking content
// returns the arguments after `prefix`, or None when the message is not that command
pub fn command_args<'a>(content: Option<&'a str>, prefix: &str) -> Option<Vec<&'a str>> {
    let mut convec = content?.split_whitespace();

    if convec.next()? != prefix {
        return None;
    };

    Some(convec.collect())
}
