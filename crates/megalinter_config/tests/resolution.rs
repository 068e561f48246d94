//! End-to-end resolution scenarios against workspaces on disk.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;

use megalinter_config::{
    ConfigError, ConfigMapping, ConfigResolver, ConfigStore, ConfigValue, Environment, RequestId,
};
use tempfile::TempDir;

fn setup(vars: &[(&str, &str)]) -> (Arc<ConfigStore>, ConfigResolver) {
    let env = Environment::from_vars(vars.iter().copied());
    let store = Arc::new(ConfigStore::with_environment(env));
    let resolver = ConfigResolver::new(Arc::clone(&store));
    (store, resolver)
}

fn params(pairs: &[(&str, &str)]) -> ConfigMapping {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), ConfigValue::from(*v)))
        .collect()
}

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).expect("write");
}

mod environment_only {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn params_override_environment() {
        let (store, resolver) = setup(&[("A", "env"), ("B", "env")]);
        let id = RequestId::from("r");

        resolver.init(&id, None, params(&[("B", "param"), ("C", "param")])).unwrap();

        assert_eq!(
            store.get_config(&id).unwrap(),
            params(&[("A", "env"), ("B", "param"), ("C", "param")])
        );
        assert_eq!(
            store.source_description(&id).unwrap(),
            "Environment variables only (no workspace)"
        );
    }

    #[test]
    fn integer_request_ids_are_independent() {
        let (store, resolver) = setup(&[]);

        resolver.init(&RequestId::from(1u64), None, params(&[("A", "1")])).unwrap();
        resolver.init(&RequestId::from(2u64), None, params(&[("A", "2")])).unwrap();

        assert_eq!(
            store.get(&RequestId::from(1u64), "A").unwrap(),
            Some(ConfigValue::from("1"))
        );
        assert_eq!(
            store.get(&RequestId::from(2u64), "A").unwrap(),
            Some(ConfigValue::from("2"))
        );
    }
}

mod config_file {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn extends_scenario() {
        let tmp = TempDir::new().expect("tmp");
        write(tmp.path(), ".mega-linter.yml", "EXTENDS: base.yml\nLOG_LEVEL: DEBUG\n");
        write(tmp.path(), "base.yml", "LOG_LEVEL: INFO\nTIMEOUT: 30\n");
        let (store, resolver) = setup(&[]);
        let id = RequestId::from("r");

        resolver.init(&id, Some(tmp.path()), ConfigMapping::new()).unwrap();

        let mut config = store.get_config(&id).unwrap();
        config.remove("EXTENDS");
        let mut expected = ConfigMapping::new();
        expected.insert("LOG_LEVEL".into(), ConfigValue::from("DEBUG"));
        expected.insert("TIMEOUT".into(), ConfigValue::Integer(30));
        assert_eq!(config, expected);
    }

    #[test]
    fn three_level_chain_child_wins() {
        let tmp = TempDir::new().expect("tmp");
        write(tmp.path(), ".mega-linter.yml", "EXTENDS: parent.yml\nK: base\n");
        write(tmp.path(), "parent.yml", "EXTENDS: grandparent.yml\nK: parent\n");
        write(tmp.path(), "grandparent.yml", "K: grandparent\n");
        let (store, resolver) = setup(&[]);
        let id = RequestId::from("r");

        resolver.init(&id, Some(tmp.path()), ConfigMapping::new()).unwrap();

        assert_eq!(store.get(&id, "K").unwrap(), Some(ConfigValue::from("base")));
        let source = store.source_description(&id).unwrap();
        assert!(source.contains("- extends from: parent.yml"));
        assert!(source.contains("- extends from: grandparent.yml"));
    }

    #[test]
    fn environment_beats_extended_and_file_values() {
        let tmp = TempDir::new().expect("tmp");
        write(tmp.path(), ".mega-linter.yml", "EXTENDS: base.yml\nLOG_LEVEL: DEBUG\n");
        write(tmp.path(), "base.yml", "TIMEOUT: 30\n");
        let (store, resolver) = setup(&[("LOG_LEVEL", "WARNING"), ("TIMEOUT", "60")]);
        let id = RequestId::from("r");

        resolver.init(&id, Some(tmp.path()), ConfigMapping::new()).unwrap();

        assert_eq!(store.get_str(&id, "LOG_LEVEL").unwrap().as_deref(), Some("WARNING"));
        assert_eq!(store.get_str(&id, "TIMEOUT").unwrap().as_deref(), Some("60"));
    }

    #[test]
    fn empty_file_keeps_environment_layer() {
        for content in ["", "   \n\n"] {
            let tmp = TempDir::new().expect("tmp");
            write(tmp.path(), ".mega-linter.yml", content);
            let (store, resolver) = setup(&[("A", "env")]);
            let id = RequestId::from("r");

            resolver.init(&id, Some(tmp.path()), params(&[("B", "param")])).unwrap();

            assert_eq!(
                store.get_config(&id).unwrap(),
                params(&[("A", "env"), ("B", "param")])
            );
        }
    }

    #[test]
    fn resolving_twice_is_idempotent() {
        let tmp = TempDir::new().expect("tmp");
        write(tmp.path(), ".megalinter.yml", "A: 1\nB: [x, y]\nC: true\n");
        let (_, resolver) = setup(&[("D", "env")]);

        let first = resolver.resolve(Some(tmp.path()), ConfigMapping::new()).unwrap();
        let second = resolver.resolve(Some(tmp.path()), ConfigMapping::new()).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn invalid_yaml_aborts_without_entry() {
        let tmp = TempDir::new().expect("tmp");
        write(tmp.path(), ".mega-linter.yml", "A: [unclosed\n");
        let (store, resolver) = setup(&[]);
        let id = RequestId::from("r");

        let result = resolver.init(&id, Some(tmp.path()), ConfigMapping::new());

        assert!(matches!(result, Err(ConfigError::Parse { .. })));
        assert!(!store.is_initialized(&id));
    }

    #[test]
    fn missing_extends_aborts_without_entry() {
        let tmp = TempDir::new().expect("tmp");
        write(tmp.path(), ".mega-linter.yml", "EXTENDS: nowhere.yml\n");
        let (store, resolver) = setup(&[]);
        let id = RequestId::from("r");

        let result = resolver.init(&id, Some(tmp.path()), ConfigMapping::new());

        assert!(matches!(result, Err(ConfigError::NotFound(_))));
        assert!(!store.is_initialized(&id));
        assert!(matches!(
            store.get_config(&id),
            Err(ConfigError::NotInitialized(_))
        ));
    }
}

mod reinitialization {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn sequential_params_are_merged() {
        let (store, resolver) = setup(&[]);
        let id = RequestId::from("r");

        resolver.init(&id, None, params(&[("A", "1")])).unwrap();
        resolver.init(&id, None, params(&[("B", "2")])).unwrap();

        let config = store.get_config(&id).unwrap();
        assert_eq!(config.get("A"), Some(&ConfigValue::from("1")));
        assert_eq!(config.get("B"), Some(&ConfigValue::from("2")));
    }

    #[test]
    fn reinit_without_params_changes_nothing() {
        let tmp = TempDir::new().expect("tmp");
        write(tmp.path(), ".mega-linter.yml", "A: file\n");
        let (store, resolver) = setup(&[]);
        let id = RequestId::from("r");

        resolver.init(&id, Some(tmp.path()), ConfigMapping::new()).unwrap();
        store.set_value(&id, "MUTATED", "yes").unwrap();
        let before = store.run_config(&id).unwrap();

        write(tmp.path(), ".mega-linter.yml", "A: changed\n");
        resolver.init(&id, Some(tmp.path()), ConfigMapping::new()).unwrap();

        assert_eq!(store.run_config(&id).unwrap(), before);
    }

    #[test]
    fn new_params_win_over_stored_values() {
        let (store, resolver) = setup(&[("A", "env")]);
        let id = RequestId::from("r");

        resolver.init(&id, None, ConfigMapping::new()).unwrap();
        resolver.init(&id, None, params(&[("A", "override")])).unwrap();

        assert_eq!(store.get(&id, "A").unwrap(), Some(ConfigValue::from("override")));
    }

    #[test]
    fn delete_allows_fresh_resolution() {
        let (store, resolver) = setup(&[]);
        let id = RequestId::from("r");

        resolver.init(&id, None, params(&[("A", "1")])).unwrap();
        store.delete(&id);
        resolver.init(&id, None, params(&[("B", "2")])).unwrap();

        assert!(!store.exists(&id, "A").unwrap());
        assert!(store.exists(&id, "B").unwrap());
    }
}

mod concurrency {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn same_request_initializations_do_not_interleave() {
        let tmp = TempDir::new().expect("tmp");
        write(tmp.path(), ".mega-linter.yml", "EXTENDS: base.yml\nA: file\n");
        write(tmp.path(), "base.yml", "B: base\n");
        let (store, resolver) = setup(&[]);
        let id = RequestId::from("shared");

        thread::scope(|scope| {
            for i in 0..8 {
                let resolver = &resolver;
                let id = &id;
                let workspace = tmp.path();
                scope.spawn(move || {
                    let key = format!("P{}", i);
                    resolver
                        .init(id, Some(workspace), params(&[(key.as_str(), "set")]))
                        .unwrap();
                });
            }
            for _ in 0..8 {
                let store = &store;
                let id = &id;
                scope.spawn(move || {
                    for _ in 0..50 {
                        if let Ok(run) = store.run_config(id) {
                            assert!(run.source_description.contains("+ Environment variables"));
                            assert!(run.source_description.contains("- extends from: base.yml"));
                            assert_eq!(run.mapping.get("B"), Some(&ConfigValue::from("base")));
                        }
                    }
                });
            }
        });

        let config = store.get_config(&id).unwrap();
        for i in 0..8 {
            assert!(config.contains_key(&format!("P{}", i)));
        }
    }

    #[test]
    fn distinct_requests_resolve_independently() {
        let (store, resolver) = setup(&[]);

        thread::scope(|scope| {
            for i in 0..16u64 {
                let resolver = &resolver;
                scope.spawn(move || {
                    let value = i.to_string();
                    resolver
                        .init(&RequestId::from(i), None, params(&[("N", value.as_str())]))
                        .unwrap();
                });
            }
        });

        for i in 0..16u64 {
            assert_eq!(
                store.get_str(&RequestId::from(i), "N").unwrap(),
                Some(i.to_string())
            );
        }
    }

    #[test]
    fn failing_inits_leave_other_requests_readable() {
        let broken = TempDir::new().expect("tmp");
        write(broken.path(), ".mega-linter.yml", "EXTENDS: missing.yml\n");
        let (store, resolver) = setup(&[]);
        let other = RequestId::from("other");
        let failing = RequestId::from("failing");
        resolver.init(&other, None, params(&[("A", "1")])).unwrap();

        thread::scope(|scope| {
            for _ in 0..4 {
                let (resolver, failing, workspace) = (&resolver, &failing, broken.path());
                scope.spawn(move || {
                    for _ in 0..25 {
                        let result = resolver.init(failing, Some(workspace), ConfigMapping::new());
                        assert!(matches!(result, Err(ConfigError::NotFound(_))));
                    }
                });
            }
            for _ in 0..4 {
                let (store, other) = (&store, &other);
                scope.spawn(move || {
                    for _ in 0..100 {
                        assert_eq!(store.get_str(other, "A").unwrap().as_deref(), Some("1"));
                    }
                });
            }
        });

        assert!(!store.is_initialized(&failing));
        assert!(store.is_initialized(&other));
    }
}
