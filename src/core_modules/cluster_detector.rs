// THEORY:
// The `ClusterDetector` is the engine of the spatial grouping layer. It takes the
// `DifferenceMask` of one comparison and groups its flagged positions into
// `Cluster`s with a connected-component search.
//
// Key architectural principles & algorithm steps:
// 1.  **Deterministic Scan**: Positions are visited column by column: `x` over the
//     scanned columns, and for each `x`, `y` over the scanned rows. The first
//     flagged, unvisited position found becomes the seed of a new cluster, so
//     cluster order is a pure function of the mask.
// 2.  **Stepped Flood Fill**: From the seed, the search looks at the 8 neighbors
//     `S` pixels away along each axis and diagonal, where `S` is the step size.
//     With `S > 1` the search moves on an `S`-spaced lattice, so flagged pixels
//     between lattice points belong to other clusters or to none.
// 3.  **Explicit Stack**: Connected regions can contain millions of pixels. The
//     frontier lives in a heap-allocated `Vec`, never on the call stack.
// 4.  **Sealing & Filtering**: Once a traversal runs dry its members are sealed
//     into a `Cluster`. Clusters no larger than the minimum size are dropped, but
//     their pixels stay visited and are never reconsidered.
// 5.  **Pull-Based Output**: `ClusterScan` is an `Iterator`. Each `next` call
//     resumes the scan exactly where the previous cluster was emitted and stops as
//     soon as the next accepted cluster is sealed. Once the cluster limit is
//     reached it does no more work at all. `find_clusters` simply drains it.

pub mod cluster_detector {
    use crate::core_modules::cluster::{Cluster, Point};
    use crate::core_modules::difference_mask::difference_mask::DifferenceMask;
    use std::iter::FusedIterator;
    use tracing::trace;

    /// Neighbor offsets as multiples of the step size.
    const NEIGHBORS: [(i64, i64); 8] = [
        (-1, -1),
        (-1, 0),
        (-1, 1),
        (0, -1),
        (0, 1),
        (1, -1),
        (1, 0),
        (1, 1),
    ];

    /// Tunables for one extraction pass.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClusterOptions {
        /// Distance between a position and each neighbor the search examines.
        /// A step of 0 is treated as 1.
        pub step: u32,
        /// Clusters are emitted only when strictly larger than this.
        pub min_cluster_size: usize,
        /// Stop after this many clusters. `None` means unlimited.
        pub limit: Option<usize>,
    }

    impl Default for ClusterOptions {
        fn default() -> Self {
            Self {
                step: 1,
                min_cluster_size: 0,
                limit: None,
            }
        }
    }

    /// Runs a full extraction pass and returns every accepted cluster.
    pub fn find_clusters(mask: DifferenceMask, options: ClusterOptions) -> Vec<Cluster> {
        ClusterScan::new(mask, options).collect()
    }

    /// A lazy, single-pass extraction over one difference mask.
    ///
    /// Owns the mask and its visited grid; dropping the scan part way through
    /// releases both without finishing the pass.
    #[derive(Debug)]
    pub struct ClusterScan {
        mask: DifferenceMask,
        visited: Vec<bool>,
        options: ClusterOptions,
        /// Next position to examine.
        cursor: Point,
        emitted: usize,
        finished: bool,
        /// Traversal frontier, reused between clusters.
        stack: Vec<Point>,
    }

    impl ClusterScan {
        pub fn new(mask: DifferenceMask, options: ClusterOptions) -> Self {
            let visited = vec![false; mask.width() as usize * mask.height() as usize];
            let cursor = Point::new(mask.scan_columns().start, mask.scan_rows().start);
            Self {
                mask,
                visited,
                options,
                cursor,
                emitted: 0,
                finished: false,
                stack: Vec::new(),
            }
        }

        /// Number of clusters emitted so far.
        pub fn emitted(&self) -> usize {
            self.emitted
        }

        #[cfg(test)]
        pub(crate) fn is_visited(&self, x: u32, y: u32) -> bool {
            let index = self.mask.index(x, y);
            self.visited.get(index).copied().unwrap_or(false)
        }

        #[cfg(test)]
        pub(crate) fn visited_count(&self) -> usize {
            self.visited.iter().filter(|cell| **cell).count()
        }

        #[cfg(test)]
        pub(crate) fn cursor(&self) -> Point {
            self.cursor
        }

        fn limit_reached(&self) -> bool {
            self.options
                .limit
                .is_some_and(|limit| self.emitted >= limit)
        }

        /// Returns the current position and moves the cursor one step down the
        /// column, wrapping to the top of the next column.
        fn advance(&mut self) -> Option<Point> {
            let columns = self.mask.scan_columns();
            let rows = self.mask.scan_rows();
            if rows.is_empty() || !columns.contains(&self.cursor.x) {
                return None;
            }

            let current = self.cursor;
            self.cursor.y += 1;
            if self.cursor.y >= rows.end {
                self.cursor.y = rows.start;
                self.cursor.x += 1;
            }
            Some(current)
        }

        /// Performs a depth-first search from `seed` and returns every reachable
        /// flagged position, marking each one visited as it is discovered.
        fn grow_cluster(&mut self, seed: Point) -> Vec<Point> {
            let step = i64::from(self.options.step.max(1));
            let width = i64::from(self.mask.width());
            let height = i64::from(self.mask.height());

            let mut members = Vec::new();
            let seed_index = self.mask.index(seed.x, seed.y);
            self.visited[seed_index] = true;
            self.stack.push(seed);

            while let Some(current) = self.stack.pop() {
                members.push(current);

                for (dx, dy) in NEIGHBORS {
                    let nx = i64::from(current.x) + dx * step;
                    let ny = i64::from(current.y) + dy * step;
                    if nx < 0 || nx >= width || ny < 0 || ny >= height {
                        continue;
                    }

                    let (nx, ny) = (nx as u32, ny as u32);
                    let index = self.mask.index(nx, ny);
                    if self.mask.get(nx, ny) && !self.visited[index] {
                        self.visited[index] = true;
                        self.stack.push(Point::new(nx, ny));
                    }
                }
            }

            members
        }
    }

    impl Iterator for ClusterScan {
        type Item = Cluster;

        fn next(&mut self) -> Option<Cluster> {
            while !self.finished {
                if self.limit_reached() {
                    break;
                }
                let Some(position) = self.advance() else {
                    break;
                };

                let index = self.mask.index(position.x, position.y);
                if !self.mask.get(position.x, position.y) || self.visited[index] {
                    continue;
                }

                let members = self.grow_cluster(position);
                let Some(cluster) = Cluster::seal(members) else {
                    continue;
                };

                if cluster.size() > self.options.min_cluster_size {
                    self.emitted += 1;
                    trace!(seed = ?position, size = cluster.size(), "cluster accepted");
                    return Some(cluster);
                }
                trace!(seed = ?position, size = cluster.size(), "cluster below minimum size");
            }

            if !self.finished {
                self.finished = true;
                // Nothing else will be read from the mask.
                self.visited = Vec::new();
                self.stack = Vec::new();
            }
            None
        }
    }

    impl FusedIterator for ClusterScan {}
}
