/// Validates that the input has `local@domain.tld` shape.
///
/// Rules:
/// - exactly one `@`, with at least one character before it
/// - the domain part contains a `.` with at least one character on each side
/// - no whitespace and no extra `@` anywhere
///
/// Deliberately loose beyond that: the confirmation email bounces if the
/// address is fake, so there is no value in a stricter parser here.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || !is_email_atom(local) {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty() && !tld.is_empty() && is_email_atom(domain)
}

fn is_email_atom(part: &str) -> bool {
    !part.is_empty() && part.chars().all(|c| !c.is_whitespace() && c != '@')
}
