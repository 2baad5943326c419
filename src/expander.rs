/// The two-character marker replaced by the shell's process id.
pub const PID_PLACEHOLDER: &str = "$$";

/// Replace every `$$` in `token` with `pid`, keeping the text around it.
///
/// Occurrences are matched left to right without overlap, so `$$$` becomes
/// `<pid>$`. A lone `$` is left alone.
pub fn expand_pid(token: &str, pid: u32) -> String {
    if !token.contains(PID_PLACEHOLDER) {
        return token.to_string();
    }

    let pid = pid.to_string();
    let mut result = String::with_capacity(token.len() + pid.len());
    let mut chars = token.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'$') {
            chars.next();
            result.push_str(&pid);
        } else {
            result.push(ch);
        }
    }

    result
}
