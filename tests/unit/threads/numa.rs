use super::*;

struct FixedNodes(Vec<usize>);

impl NumaTopology for FixedNodes {
    fn node_count(&self) -> usize {
        self.0.len()
    }

    fn node_thread_count(&self, node: usize) -> usize {
        self.0[node]
    }

    fn pin_current_thread(&self, _node: usize, _slot: usize) -> bool {
        true
    }
}

fn nodes_of(placements: &[NumaPlacement]) -> Vec<usize> {
    placements.iter().map(|p| p.node).collect()
}

#[test]
fn cpulist_parses_ranges_and_singles() {
    assert_eq!(parse_cpulist("0-3,8,10-11\n").unwrap(), vec![0, 1, 2, 3, 8, 10, 11]);
    assert_eq!(parse_cpulist("").unwrap(), Vec::<usize>::new());
    assert!(parse_cpulist("3-1").is_err());
    assert!(parse_cpulist("a-b").is_err());
}

#[test]
fn placement_is_proportional_and_contiguous() {
    let topo = FixedNodes(vec![4, 4]);
    let plan = plan_placement(&topo, 8).unwrap();
    assert_eq!(nodes_of(&plan), vec![0, 0, 0, 0, 1, 1, 1, 1]);
    assert_eq!(plan[5], NumaPlacement { node: 1, slot: 1 });

    let topo = FixedNodes(vec![6, 2]);
    let plan = plan_placement(&topo, 4).unwrap();
    assert_eq!(nodes_of(&plan), vec![0, 0, 0, 1]);
}

#[test]
fn placement_hands_leftovers_to_largest_remainders() {
    let topo = FixedNodes(vec![1, 1, 1]);
    let plan = plan_placement(&topo, 4).unwrap();
    assert_eq!(plan.len(), 4);
    assert_eq!(nodes_of(&plan), vec![0, 0, 1, 2]);

    let topo = FixedNodes(vec![1, 3]);
    let plan = plan_placement(&topo, 2).unwrap();
    assert_eq!(nodes_of(&plan), vec![0, 1]);
}

#[test]
fn placement_without_capacity_degrades_to_none() {
    assert!(plan_placement(&NoNuma, 4).is_none());
    assert!(plan_placement(&FixedNodes(vec![0, 0]), 4).is_none());
}

#[test]
fn bands_cover_the_screen_without_gaps() {
    let bands: Vec<_> = (0..3).map(|n| numa_band(n, 3, 1080)).collect();
    assert_eq!(bands, vec![(0, 360), (360, 720), (720, 1080)]);
    assert_eq!(numa_band(0, 1, 7), (0, 7));
}

#[test]
fn sysfs_root_is_read_in_node_order() {
    let root = std::env::temp_dir().join(format!("drawpool-numa-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&root);
    for (node, list) in [("node1", "4-5\n"), ("node0", "0-3\n"), ("possible", "")] {
        let dir = root.join(node);
        std::fs::create_dir_all(&dir).unwrap();
        if node.starts_with("node") {
            std::fs::write(dir.join("cpulist"), list).unwrap();
        }
    }

    let topo = SysfsNuma::from_sysfs_root(&root).unwrap();
    assert_eq!(topo.node_count(), 2);
    assert_eq!(topo.cpus(0), &[0, 1, 2, 3]);
    assert_eq!(topo.node_thread_count(1), 2);
    assert_eq!(topo.cpus(9), &[] as &[usize]);

    std::fs::remove_dir_all(&root).unwrap();
}

#[test]
fn missing_sysfs_root_is_an_error_not_a_panic() {
    let root = std::env::temp_dir().join("drawpool-numa-does-not-exist");
    assert!(SysfsNuma::from_sysfs_root(&root).is_err());
    assert!(SysfsNuma::from_node_cpus(vec![vec![], vec![]]).is_err());
}

#[test]
fn detection_needs_more_than_one_node() {
    let root = std::env::temp_dir().join(format!("drawpool-numa-single-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&root);
    std::fs::create_dir_all(root.join("node0")).unwrap();
    std::fs::write(root.join("node0").join("cpulist"), "0-7\n").unwrap();

    assert!(SysfsNuma::from_sysfs_root(&root).is_ok());
    assert!(SysfsNuma::detect_at(&root).is_none());

    std::fs::create_dir_all(root.join("node1")).unwrap();
    std::fs::write(root.join("node1").join("cpulist"), "8-15\n").unwrap();
    let topo = SysfsNuma::detect_at(&root).unwrap();
    assert_eq!(topo.node_count(), 2);

    std::fs::remove_dir_all(&root).unwrap();
    assert!(SysfsNuma::detect_at(&root).is_none());
}
