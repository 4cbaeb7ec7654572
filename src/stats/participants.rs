use crate::models::PublicUser;

/// Case-insensitive substring search over login, first and last name.
/// A blank term matches nobody.
pub fn search<'a>(users: &'a [PublicUser], term: &str) -> Vec<&'a PublicUser> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let contains = |field: Option<&str>| {
        field.is_some_and(|value| value.to_lowercase().contains(&needle))
    };

    users
        .iter()
        .filter(|user| {
            contains(Some(&user.login))
                || contains(user.first_name.as_deref())
                || contains(user.last_name.as_deref())
        })
        .collect()
}

pub fn find_login<'a>(users: &'a [PublicUser], login: &str) -> Option<&'a PublicUser> {
    let login = login.trim();
    users
        .iter()
        .find(|user| user.login.eq_ignore_ascii_case(login))
}
