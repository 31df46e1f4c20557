use std::path::Path;

use crate::foundation::error::{DrawerError, DrawerResult};

/// Memory-locality topology the pool consults when placing workers.
///
/// Every method is advisory. A topology that reports no nodes, or fails to pin, makes the pool
/// fall back to unpinned workers.
pub trait NumaTopology: Send + Sync {
    /// Number of NUMA nodes. `0` means no topology is available.
    fn node_count(&self) -> usize;

    /// Hardware threads available on `node`.
    fn node_thread_count(&self, node: usize) -> usize;

    /// Pin the calling thread near `node`. `slot` is the worker's index within the node.
    /// Returns `false` when pinning is unsupported or failed.
    fn pin_current_thread(&self, node: usize, slot: usize) -> bool;
}

/// Topology for platforms without NUMA information.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoNuma;

impl NumaTopology for NoNuma {
    fn node_count(&self) -> usize {
        0
    }

    fn node_thread_count(&self, _node: usize) -> usize {
        0
    }

    fn pin_current_thread(&self, _node: usize, _slot: usize) -> bool {
        false
    }
}

/// Linux topology read from `/sys/devices/system/node`, pinned through `core_affinity`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SysfsNuma {
    node_cpus: Vec<Vec<usize>>,
}

const SYSFS_NODE_ROOT: &str = "/sys/devices/system/node";

impl SysfsNuma {
    /// Read the running machine's topology. `None` when it is unavailable, unreadable or has a
    /// single node, in which case workers are not pinned.
    pub fn detect() -> Option<Self> {
        Self::detect_at(Path::new(SYSFS_NODE_ROOT))
    }

    pub(crate) fn detect_at(root: &Path) -> Option<Self> {
        match Self::from_sysfs_root(root) {
            Ok(topology) if topology.node_count() >= 2 => Some(topology),
            Ok(topology) => {
                tracing::debug!(
                    nodes = topology.node_count(),
                    "single numa node, drawer threads stay unpinned"
                );
                None
            }
            Err(e) => {
                tracing::debug!(error = %e, "numa topology unavailable");
                None
            }
        }
    }

    /// Read `node<N>/cpulist` files under `root`.
    pub fn from_sysfs_root(root: &Path) -> DrawerResult<Self> {
        let entries = std::fs::read_dir(root)
            .map_err(|e| anyhow::Error::new(e).context(format!("read '{}'", root.display())))?;

        let mut nodes = Vec::<(usize, Vec<usize>)>::new();
        for entry in entries {
            let entry = entry.map_err(anyhow::Error::new)?;
            let name = entry.file_name();
            let Some(index) = name
                .to_str()
                .and_then(|n| n.strip_prefix("node"))
                .and_then(|n| n.parse::<usize>().ok())
            else {
                continue;
            };
            let list_path = entry.path().join("cpulist");
            let list = std::fs::read_to_string(&list_path).map_err(|e| {
                anyhow::Error::new(e).context(format!("read '{}'", list_path.display()))
            })?;
            nodes.push((index, parse_cpulist(&list)?));
        }
        nodes.sort_by_key(|(index, _)| *index);

        Self::from_node_cpus(nodes.into_iter().map(|(_, cpus)| cpus).collect())
    }

    /// Topology from explicit per-node CPU lists. Empty nodes are dropped.
    pub fn from_node_cpus(node_cpus: Vec<Vec<usize>>) -> DrawerResult<Self> {
        let node_cpus: Vec<Vec<usize>> = node_cpus.into_iter().filter(|c| !c.is_empty()).collect();
        if node_cpus.is_empty() {
            return Err(DrawerError::validation("numa topology has no cpus"));
        }
        Ok(Self { node_cpus })
    }

    /// CPU ids that belong to `node`.
    pub fn cpus(&self, node: usize) -> &[usize] {
        self.node_cpus.get(node).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl NumaTopology for SysfsNuma {
    fn node_count(&self) -> usize {
        self.node_cpus.len()
    }

    fn node_thread_count(&self, node: usize) -> usize {
        self.cpus(node).len()
    }

    fn pin_current_thread(&self, node: usize, slot: usize) -> bool {
        let cpus = self.cpus(node);
        if cpus.is_empty() {
            return false;
        }
        core_affinity::set_for_current(core_affinity::CoreId {
            id: cpus[slot % cpus.len()],
        })
    }
}

/// Parse a kernel cpulist such as `0-3,8,10-11`.
pub fn parse_cpulist(list: &str) -> DrawerResult<Vec<usize>> {
    let mut cpus = Vec::new();
    for part in list.trim().split(',').filter(|p| !p.is_empty()) {
        let bad = || DrawerError::validation(format!("invalid cpulist entry '{part}'"));
        match part.split_once('-') {
            Some((lo, hi)) => {
                let lo: usize = lo.trim().parse().map_err(|_| bad())?;
                let hi: usize = hi.trim().parse().map_err(|_| bad())?;
                if hi < lo {
                    return Err(bad());
                }
                cpus.extend(lo..=hi);
            }
            None => cpus.push(part.trim().parse().map_err(|_| bad())?),
        }
    }
    Ok(cpus)
}

/// Where a worker lives in the topology.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct NumaPlacement {
    pub(crate) node: usize,
    pub(crate) slot: usize,
}

/// Spread `workers` over the topology's nodes in proportion to each node's thread count.
///
/// Workers are assigned in contiguous runs: node 0 takes the first cores, node 1 the next, and so
/// on. Leftover workers from rounding go to the nodes with the largest remainders. Returns `None`
/// when the topology reports no usable capacity.
pub(crate) fn plan_placement(
    topology: &dyn NumaTopology,
    workers: usize,
) -> Option<Vec<NumaPlacement>> {
    let capacities: Vec<usize> = (0..topology.node_count())
        .map(|n| topology.node_thread_count(n))
        .collect();
    let total: usize = capacities.iter().sum();
    if total == 0 || workers == 0 {
        return None;
    }

    let mut quotas: Vec<usize> = capacities.iter().map(|c| workers * c / total).collect();
    let mut leftover = workers - quotas.iter().sum::<usize>();
    let mut by_remainder: Vec<usize> = (0..capacities.len()).collect();
    by_remainder.sort_by_key(|&n| std::cmp::Reverse((workers * capacities[n]) % total));
    for &node in by_remainder.iter().cycle() {
        if leftover == 0 {
            break;
        }
        quotas[node] += 1;
        leftover -= 1;
    }

    let mut placements = Vec::with_capacity(workers);
    for (node, &quota) in quotas.iter().enumerate() {
        placements.extend((0..quota).map(|slot| NumaPlacement { node, slot }));
    }
    Some(placements)
}

/// Scanline band `[start, end)` of `node` when `height` lines are split evenly over `nodes`.
pub(crate) fn numa_band(node: usize, nodes: usize, height: u32) -> (i32, i32) {
    let nodes = nodes.max(1) as i64;
    let height = height as i64;
    let node = node as i64;
    (
        (node * height / nodes) as i32,
        ((node + 1) * height / nodes) as i32,
    )
}

#[cfg(test)]
#[path = "../../tests/unit/threads/numa.rs"]
mod tests;
