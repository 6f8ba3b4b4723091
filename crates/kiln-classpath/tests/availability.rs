use std::path::Path;

use kiln_classpath::{AbiAvailability, ClasspathIndex, DirPlatformIndex, ModuleClasses};
use kiln_core::TargetId;

fn touch(path: &Path) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, b"\xca\xfe\xba\xbe").unwrap();
}

#[test]
fn resolves_against_deps_and_platform_directory() {
    let platform_root = tempfile::tempdir().unwrap();
    touch(&platform_root.path().join("java/lang/Object.class"));
    touch(&platform_root.path().join("java/util/List.class"));

    let dep = TargetId::library("//lib:collections");
    let classes = ModuleClasses::new(
        dep.clone(),
        [
            "com/example/Multimap.class".to_owned(),
            "com/example/Multiset.class".to_owned(),
        ],
    );
    let resolver = AbiAvailability::new(
        ClasspathIndex::new(vec![classes.clone()]),
        ClasspathIndex::new(vec![classes]),
        DirPlatformIndex::new(platform_root.path()),
        TargetId::library("//app:main"),
        false,
    );

    // Dependency-provided, nested class resolves through its top-level type.
    assert!(resolver
        .is_available_for_interface_only("com.example.Multimap$Entry")
        .unwrap());
    assert_eq!(resolver.owning_module("com.example.Multiset"), Some(&dep));

    // Platform-provided.
    assert!(resolver
        .is_available_for_interface_only("java.lang.Object")
        .unwrap());
    assert!(resolver
        .is_available_for_interface_only("java.util.List")
        .unwrap());

    // Neither.
    assert!(!resolver
        .is_available_for_interface_only("com.example.Absent")
        .unwrap());
    assert!(resolver.owning_module("com.example.Absent").is_none());
}
