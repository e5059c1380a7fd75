//! Command options and arguments derived from a batch.

use teamsync_core::Resource;
use teamsync_remote::LocalOption;

/// `-l` for shallow batches; nothing when recursing.
pub fn local_options(recurse: bool) -> Vec<LocalOption> {
    if recurse {
        Vec::new()
    } else {
        vec![LocalOption::DoNotRecurse]
    }
}

/// Project-relative paths of `resources`; the project root becomes `.`.
pub fn string_arguments(resources: &[Resource]) -> Vec<String> {
    resources
        .iter()
        .map(|r| {
            if r.path.is_empty() {
                ".".to_string()
            } else {
                r.path.clone()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shallow_batches_do_not_recurse() {
        assert_eq!(local_options(false), vec![LocalOption::DoNotRecurse]);
        assert!(local_options(true).is_empty());
    }

    #[test]
    fn project_root_is_dot() {
        let args = string_arguments(&[
            Resource::project("core"),
            Resource::folder("core", "src/"),
            Resource::file("core", "src/lib.rs"),
        ]);
        assert_eq!(args, vec![".", "src", "src/lib.rs"]);
    }
}
