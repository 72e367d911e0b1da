use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use pretty_assertions::assert_eq;
use rstest::rstest;

use super::*;
use crate::config::WarningMode;
use crate::role::RoleViolation;

fn registry() -> ConfigurationRegistry {
	ConfigurationRegistry::with_settings(
		ComponentIdentity::new("org.example", "app", "1.0"),
		&RegistrySettings {
			owner: "project ':app'".into(),
			warning_mode: WarningMode::None,
			..RegistrySettings::default()
		},
	)
}

fn summaries(registry: &ConfigurationRegistry) -> Vec<String> {
	registry.diagnostics().reported().into_iter().map(|d| d.summary).collect()
}

#[test]
fn create_twice_is_duplicate() {
	let registry = registry();
	let first = registry.create("api", Role::DependencyScope).unwrap();

	assert_eq!(
		registry.create("api", Role::DependencyScope).unwrap_err(),
		RegistryError::DuplicateName { name: "api".into() }
	);
	assert_eq!(registry.len(), 1);
	assert!(Arc::ptr_eq(&registry.get_by_name("api").unwrap(), &first));
}

/// A conflicting role on an existing name fails and keeps the original entry.
#[test]
fn create_with_conflicting_role_is_role_conflict() {
	let registry = registry();
	registry.create("x", Role::Consumable).unwrap();

	assert_eq!(
		registry.create("x", Role::Resolvable).unwrap_err(),
		RegistryError::RoleConflict {
			name: "x".into(),
			violation: RoleViolation {
				current: Role::Consumable,
				requested: Role::Resolvable,
			},
		}
	);
	assert_eq!(registry.names(), ["x"]);
	assert_eq!(registry.get_by_name("x").unwrap().role(), Role::Consumable);
}

#[test]
fn configure_runs_before_publication() {
	let registry = registry();
	let seen_during_configure = AtomicUsize::new(usize::MAX);

	let created = registry
		.create_locked_with("runtimeElements", Role::Consumable, |c| {
			seen_during_configure.store(registry.len(), Ordering::SeqCst);
			assert!(!c.is_locked());
			c.attribute("usage", "runtime");
		})
		.unwrap();

	assert_eq!(seen_during_configure.load(Ordering::SeqCst), 0);
	assert!(created.is_locked());
	assert_eq!(created.attributes().to_string(), "{usage=runtime}");
}

#[test]
fn create_leaves_entry_unlocked() {
	let registry = registry();
	let c = registry.create("implementation", Role::DependencyScope).unwrap();

	assert!(!c.is_locked());
	c.add_dependency(Dependency::new("org.example", "lib")).unwrap();
	assert!(registry.create_locked("api", Role::DependencyScope).unwrap().is_locked());
}

#[test]
fn get_by_name_reports_missing_name() {
	let registry = registry();
	let err = registry.get_by_name("nope").unwrap_err();

	assert_eq!(err.to_string(), "Configuration with name 'nope' not found.");
	assert!(registry.find_by_name("nope").is_none());
}

#[test]
fn maybe_create_returns_same_locked_entry() {
	let registry = registry();
	let request = CreationRequest::new("compileClasspath", Role::Resolvable);

	let first = registry.maybe_create(&request, true).unwrap();
	let second = registry.maybe_create(&request, true).unwrap();

	assert!(Arc::ptr_eq(&first, &second));
	assert!(first.is_locked());
	assert_eq!(registry.len(), 1);
}

/// Verification locks an entry that was created unlocked elsewhere.
#[test]
fn maybe_create_locks_preexisting_entry() {
	let registry = registry();
	let created = registry.create("implementation", Role::DependencyScope).unwrap();

	let found = registry.maybe_create_dependency_scope_locked("implementation", true).unwrap();
	assert!(Arc::ptr_eq(&created, &found));
	assert!(found.is_locked());
	assert!(matches!(
		created.add_dependency(Dependency::new("org.example", "lib")),
		Err(RegistryError::UsageMutationRejected { .. })
	));
}

#[test]
fn maybe_create_without_verification_is_plain_lookup() {
	let registry = registry();
	let created = registry.create("implementation", Role::LegacyAll).unwrap();

	let found = registry.maybe_create_dependency_scope_locked("implementation", false).unwrap();
	assert!(Arc::ptr_eq(&created, &found));
	assert!(!found.is_locked());
	assert_eq!(found.role(), Role::LegacyAll);
}

#[test]
fn maybe_create_with_incompatible_role_conflicts() {
	let registry = registry();
	registry.maybe_create_consumable_locked("elements").unwrap();

	let err = registry.maybe_create_resolvable_locked("elements").unwrap_err();
	assert!(matches!(err, RegistryError::RoleConflict { ref name, .. } if name == "elements"));
	assert_eq!(registry.get_by_name("elements").unwrap().role(), Role::Consumable);
}

#[test]
fn maybe_create_rejects_legacy_role() {
	let registry = registry();
	let err = registry
		.maybe_create(&CreationRequest::new("everything", Role::LegacyAll), true)
		.unwrap_err();

	assert_eq!(
		err,
		RegistryError::InvalidMaybeCreateRole {
			name: "everything".into(),
			role: Role::LegacyAll,
		}
	);
	assert!(registry.is_empty());
}

#[test]
fn deprecated_role_is_reported_on_creation() {
	let registry = registry();
	let c = registry.maybe_create_resolvable_dependency_scope_locked("legacy").unwrap();

	assert_eq!(c.role(), Role::ResolvableDependencyScope);
	assert_eq!(
		summaries(&registry),
		["Creating configuration 'legacy' with the Resolvable Dependency Scope role."]
	);
}

#[rstest]
#[case("detachedConfiguration", true)]
#[case("detachedConfiguration12", true)]
#[case("detachedConfigurationX", false)]
#[case("myDetachedConfiguration", false)]
fn reserved_names(#[case] name: &str, #[case] reserved: bool) {
	assert_eq!(is_reserved_name(name), reserved);
}

/// Reserved names are a warning, not a failure.
#[test]
fn reserved_name_creation_warns_and_proceeds() {
	let registry = registry();
	registry.create("detachedConfiguration3", Role::Resolvable).unwrap();

	assert!(registry.contains("detachedConfiguration3"));
	let reported = registry.diagnostics().reported();
	assert_eq!(reported.len(), 1);
	assert_eq!(reported[0].guide_section, Some("reserved_configuration_names"));
	assert_eq!(
		reported[0].advice.as_deref(),
		Some("Use a different name for the configuration 'detachedConfiguration3'.")
	);
}

#[test]
fn detached_configuration_copies_dependencies() {
	let registry = registry();
	let dep_a = Dependency::new("org.example", "a").with_version("1.0");
	let dep_b = Dependency::new("org.example", "b");
	registry.create("consumable", Role::Consumable).unwrap();

	let detached = registry.detached_configuration([&dep_a, &dep_b]);

	let deps = detached.dependencies();
	assert_eq!(deps.iter().map(|d| (**d).clone()).collect::<Vec<_>>(), vec![dep_a.clone(), dep_b.clone()]);
	assert!(!std::ptr::eq(&*deps[0], &dep_a));
	assert!(!std::ptr::eq(&*deps[1], &dep_b));

	assert!(detached.is_detached());
	assert_eq!(detached.name(), "detachedConfiguration1");
	assert_eq!(detached.role(), Role::ResolvableDependencyScope);
	assert_eq!(detached.component().to_string(), "org.example:app-detached:1.0");
	assert!(!registry.contains(detached.name()));

	let mut visited = Vec::new();
	registry.visit_consumable(|c| visited.push(c.name().to_owned()));
	assert_eq!(visited, ["consumable"]);
	assert!(registry.diagnostics().reported().is_empty());
}

#[test]
fn detached_names_are_unique_per_registry() {
	let registry = registry();
	let names: Vec<String> = (0..3)
		.map(|_| registry.detached_configuration([]).name().to_owned())
		.collect();
	assert_eq!(names, ["detachedConfiguration1", "detachedConfiguration2", "detachedConfiguration3"]);

	let other = self::registry();
	assert_eq!(other.detached_configuration([]).name(), "detachedConfiguration1");
}

#[test]
fn detached_entries_skip_validators() {
	let registry = registry();
	let calls = Arc::new(AtomicUsize::new(0));
	let counter = Arc::clone(&calls);
	registry.add_validator(move |_: &HierarchyMutation<'_>| -> std::result::Result<(), String> {
		counter.fetch_add(1, Ordering::SeqCst);
		Ok(())
	});

	registry.detached_configuration([]);
	assert_eq!(calls.load(Ordering::SeqCst), 0);
	registry.create("api", Role::DependencyScope).unwrap();
	assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn detached_entries_cannot_join_the_hierarchy() {
	let registry = registry();
	let scope = registry.create("implementation", Role::DependencyScope).unwrap();
	let detached = registry.detached_configuration([]);

	assert!(matches!(
		detached.extends_from(&scope),
		Err(RegistryError::HierarchyValidationRejected { .. })
	));
}

#[test]
fn visit_consumable_follows_insertion_order() {
	let registry = registry();
	registry.create("zeta", Role::Consumable).unwrap();
	registry.create("deps", Role::DependencyScope).unwrap();
	registry.create("alpha", Role::LegacyAll).unwrap();
	registry.consumable("lazy").unwrap();

	let mut visited = Vec::new();
	registry.visit_consumable(|c| visited.push(c.name().to_owned()));
	assert_eq!(visited, ["zeta", "alpha", "lazy"]);
}

#[test]
fn rejected_add_is_rolled_back() {
	let registry = registry();
	registry.add_validator(|m: &HierarchyMutation<'_>| -> std::result::Result<(), String> {
		if m.name.starts_with("forbidden") {
			Err("name is forbidden".to_string())
		} else {
			Ok(())
		}
	});

	assert_eq!(
		registry.create("forbiddenApi", Role::Consumable).unwrap_err(),
		RegistryError::HierarchyValidationRejected {
			name: "forbiddenApi".into(),
			mutation: "add",
			reason: "name is forbidden".into(),
		}
	);
	assert!(matches!(
		registry.register("forbiddenLazy", Role::Consumable),
		Err(RegistryError::HierarchyValidationRejected { mutation: "register", .. })
	));
	assert!(registry.is_empty());
	registry.create("api", Role::Consumable).unwrap();
	assert_eq!(registry.names(), ["api"]);
}

/// Validators run in order and the first rejection wins.
#[test]
fn first_rejection_wins() {
	let registry = registry();
	let second_ran = Arc::new(AtomicUsize::new(0));
	let flag = Arc::clone(&second_ran);
	registry.add_validator(|_: &HierarchyMutation<'_>| -> std::result::Result<(), String> { Err("first".to_string()) });
	registry.add_validator(move |_: &HierarchyMutation<'_>| -> std::result::Result<(), String> {
		flag.fetch_add(1, Ordering::SeqCst);
		Err("second".to_string())
	});

	let err = registry.create("api", Role::Consumable).unwrap_err();
	assert!(matches!(err, RegistryError::HierarchyValidationRejected { ref reason, .. } if reason == "first"));
	assert_eq!(second_ran.load(Ordering::SeqCst), 0);
}

#[test]
fn validators_see_the_mutation() {
	let registry = registry();
	registry.create("existing", Role::Consumable).unwrap();
	let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
	let log = Arc::clone(&seen);
	registry.add_validator(move |m: &HierarchyMutation<'_>| -> std::result::Result<(), String> {
		log.lock()
			.push((m.kind, m.name.to_owned(), m.entry.is_some(), m.names().count()));
		Ok(())
	});

	registry.create("eager", Role::Consumable).unwrap();
	registry.resolvable("lazy").unwrap();
	registry.remove("existing").unwrap();

	assert_eq!(
		*seen.lock(),
		vec![
			(MutationKind::Add, "eager".to_owned(), true, 1),
			(MutationKind::LazyAdd, "lazy".to_owned(), false, 2),
			(MutationKind::Remove, "existing".to_owned(), true, 3),
		]
	);
}

#[test]
fn removing_an_extended_parent_is_rejected() {
	let registry = registry();
	let api = registry.create("api", Role::DependencyScope).unwrap();
	registry
		.create_with("implementation", Role::DependencyScope, |c| c.extends_from(&api).unwrap())
		.unwrap();

	let err = registry.remove("api").unwrap_err();
	assert_eq!(
		err.to_string(),
		"cannot remove configuration 'api': it is extended by implementation"
	);
	assert!(registry.contains("api"));

	registry.remove("implementation").unwrap();
	registry.remove("api").unwrap();
	assert!(registry.is_empty());
	assert!(matches!(registry.remove("api"), Err(RegistryError::NotFound { .. })));
}

#[test]
fn lazy_provider_realizes_once() {
	let registry = registry();
	let runs = Arc::new(AtomicUsize::new(0));
	let counter = Arc::clone(&runs);
	let provider = registry
		.register_with("apiElements", Role::Consumable, move |c| {
			counter.fetch_add(1, Ordering::SeqCst);
			c.attribute("usage", "api");
		})
		.unwrap();

	assert!(!provider.is_realized());
	assert_eq!(registry.names(), ["apiElements"]);
	assert_eq!(runs.load(Ordering::SeqCst), 0);

	let first = registry.get_by_name("apiElements").unwrap();
	let second = provider.get();
	assert!(Arc::ptr_eq(&first, &second));
	assert_eq!(runs.load(Ordering::SeqCst), 1);
	assert!(first.is_locked());
	assert_eq!(first.attributes().to_string(), "{usage=api}");
}

#[test]
fn lazy_registration_holds_its_name() {
	let registry = registry();
	registry.dependency_scope("implementation").unwrap();

	assert!(matches!(
		registry.create("implementation", Role::DependencyScope),
		Err(RegistryError::DuplicateName { .. })
	));
	assert!(matches!(
		registry.create("implementation", Role::Consumable),
		Err(RegistryError::RoleConflict { .. })
	));
	assert!(!registry.named("implementation").unwrap().is_realized());
}

#[test]
fn sealed_registry_rejects_structural_changes() {
	let registry = registry();
	let api = registry.create("api", Role::Consumable).unwrap();
	registry.seal();

	assert!(registry.is_sealed());
	assert_eq!(
		registry.create("late", Role::Consumable).unwrap_err(),
		RegistryError::ContainerSealed {
			container: "configuration container for project ':app'".into(),
			method: "create",
		}
	);
	assert!(matches!(registry.consumable("late"), Err(RegistryError::ContainerSealed { method: "consumable", .. })));
	assert!(matches!(registry.remove("api"), Err(RegistryError::ContainerSealed { .. })));
	assert!(matches!(
		registry.maybe_create_resolvable_locked("late"),
		Err(RegistryError::ContainerSealed { .. })
	));

	let found = registry.maybe_create_consumable_locked("api").unwrap();
	assert!(Arc::ptr_eq(&found, &api));
	assert_eq!(registry.len(), 1);
}

/// Legacy additions warn on every call, not just the first.
#[test]
fn legacy_adds_warn_every_time() {
	let registry = registry();
	let added = registry.add("one").unwrap();
	registry.add("two").unwrap();
	registry.add_all(["three", "four"]).unwrap();
	registry.add_later("five", |_| {}).unwrap();
	registry.add_all_later(["six"]).unwrap();

	assert_eq!(added.role(), Role::LegacyAll);
	assert!(!added.is_locked());
	assert_eq!(registry.len(), 6);
	assert!(!registry.find_by_name("five").unwrap().is_locked());
	assert_eq!(
		summaries(&registry),
		[
			"Adding a configuration directly to the configuration container.",
			"Adding a configuration directly to the configuration container.",
			"Adding a collection of configurations directly to the configuration container.",
			"Adding a configuration provider directly to the configuration container.",
			"Adding a provider of configurations directly to the configuration container.",
		]
	);
	assert!(registry.diagnostics().reported().iter().all(|d| d.advice.as_deref() == Some("Use a factory method instead.")));
}

#[test]
fn legacy_add_still_rejects_duplicates() {
	let registry = registry();
	registry.add("one").unwrap();
	assert!(matches!(registry.add("one"), Err(RegistryError::DuplicateName { .. })));
	assert_eq!(registry.diagnostics().count(), 2);
}

#[test]
fn all_realizes_pending_entries() {
	let registry = registry();
	registry.create("eager", Role::Resolvable).unwrap();
	let lazy = registry.resolvable("lazy").unwrap();

	let names: Vec<String> = registry.all().iter().map(|c| c.name().to_owned()).collect();
	assert_eq!(names, ["eager", "lazy"]);
	assert!(lazy.is_realized());
}

#[test]
fn display_name_mentions_owner() {
	let registry = ConfigurationRegistry::new("project ':lib'", ComponentIdentity::default());
	assert_eq!(registry.display_name(), "configuration container for project ':lib'");
	assert_eq!(registry.to_string(), registry.display_name());
	assert_eq!(registry.root_component(), &ComponentIdentity::default());
}

/// A role-specific registration keeps its role even if its configure action tries to
/// change it.
#[test]
fn role_specific_registration_keeps_its_role() {
	let registry = registry();
	let attempt = Arc::new(parking_lot::Mutex::new(None));
	let slot = Arc::clone(&attempt);
	let provider = registry
		.register_with("apiElements", Role::Consumable, move |c| {
			*slot.lock() = Some(c.set_role(Role::Resolvable));
		})
		.unwrap();

	let mut visited = Vec::new();
	registry.visit_consumable(|c| visited.push(c.name().to_owned()));

	assert_eq!(visited, ["apiElements"]);
	assert!(matches!(
		*attempt.lock(),
		Some(Err(RegistryError::UsageMutationRejected { .. }))
	));
	let realized = provider.get();
	assert_eq!(realized.role(), provider.role());
	assert!(realized.is_locked());
}

#[test]
fn legacy_registration_may_narrow_its_role() {
	let registry = registry();
	let provider = registry
		.add_later("legacy", |c| c.set_role(Role::Resolvable).unwrap())
		.unwrap();

	let mut visited = Vec::new();
	registry.visit_consumable(|c| visited.push(c.name().to_owned()));

	assert!(visited.is_empty());
	assert!(provider.is_realized());
	assert_eq!(provider.get().role(), Role::Resolvable);
}

#[test]
fn visit_consumable_leaves_pending_non_consumables_alone() {
	let registry = registry();
	let runs = Arc::new(AtomicUsize::new(0));
	let counter = Arc::clone(&runs);
	let classpath = registry
		.register_with("compileClasspath", Role::Resolvable, move |_| {
			counter.fetch_add(1, Ordering::SeqCst);
		})
		.unwrap();
	let scope = registry.dependency_scope("implementation").unwrap();
	registry.consumable("apiElements").unwrap();

	let mut visited = Vec::new();
	registry.visit_consumable(|c| visited.push(c.name().to_owned()));

	assert_eq!(visited, ["apiElements"]);
	assert!(!classpath.is_realized());
	assert!(!scope.is_realized());
	assert_eq!(runs.load(Ordering::SeqCst), 0);
}

/// A batch with one bad name publishes none of its names.
#[test]
fn add_all_is_all_or_nothing() {
	let registry = registry();
	assert_eq!(
		registry.add_all(["a", "b", "a"]).unwrap_err(),
		RegistryError::DuplicateName { name: "a".into() }
	);
	assert!(registry.is_empty());

	registry.create("taken", Role::Consumable).unwrap();
	assert!(matches!(
		registry.add_all_later(["c", "taken"]),
		Err(RegistryError::RoleConflict { .. })
	));
	assert_eq!(registry.names(), ["taken"]);

	registry.add_validator(|m: &HierarchyMutation<'_>| -> std::result::Result<(), String> {
		if m.name == "blocked" {
			Err("blocked".to_string())
		} else {
			Ok(())
		}
	});
	assert!(matches!(
		registry.add_all(["d", "blocked"]),
		Err(RegistryError::HierarchyValidationRejected { .. })
	));
	assert_eq!(registry.names(), ["taken"]);

	let added = registry.add_all(["a", "b"]).unwrap();
	assert_eq!(added.len(), 2);
	assert_eq!(registry.names(), ["taken", "a", "b"]);
}

/// Deprecations are only reported for entries that actually get published.
#[test]
fn failed_registration_reports_no_deprecation() {
	let registry = registry();
	registry.resolvable("legacy").unwrap();

	assert!(matches!(
		registry.register("legacy", Role::ResolvableDependencyScope),
		Err(RegistryError::RoleConflict { .. })
	));
	assert!(matches!(
		registry.add_all(["detachedConfiguration7", "legacy"]),
		Err(RegistryError::RoleConflict { .. })
	));
	registry.seal();
	assert!(matches!(
		registry.register("detachedConfiguration8", Role::Resolvable),
		Err(RegistryError::ContainerSealed { .. })
	));

	assert_eq!(
		summaries(&registry),
		["Adding a collection of configurations directly to the configuration container."]
	);
}

#[test]
fn panicking_configure_poisons_the_provider() {
	let registry = registry();
	let provider = registry
		.register_with("broken", Role::Consumable, |_| panic!("configure failed"))
		.unwrap();

	let first = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| provider.get()));
	let second = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| provider.get()));

	assert!(first.is_err());
	assert!(second.is_err());
	assert!(!provider.is_realized());
	assert!(registry.contains("broken"));
}
