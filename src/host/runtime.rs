//! Runtime statistics source.
//!
//! The host refreshes two gauges from this source before rendering metrics.
//! It is a trait so tests and embedders can supply their own readings.

use sysinfo::System;

/// One reading of process-level statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeReading {
    /// Memory currently allocated by the process, in bytes.
    pub allocated_bytes: i64,
    /// Number of live worker threads.
    pub workers: i64,
}

/// Provider of process-level statistics.
pub trait RuntimeStats: Send + Sync {
    fn read(&self) -> RuntimeReading;
}

/// Reads resident memory and thread count of the current process.
///
/// Memory comes from `sysinfo`. Threads are counted from `/proc/self/task`
/// on unix and read as zero elsewhere. A failed process lookup reads as zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessStats;

impl RuntimeStats for ProcessStats {
    fn read(&self) -> RuntimeReading {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => pid,
            Err(e) => {
                tracing::trace!(error = %e, "Current process id not available");
                return RuntimeReading::default();
            }
        };

        let mut sys = System::new();
        if !sys.refresh_process(pid) {
            tracing::trace!(pid = %pid, "Process not found");
            return RuntimeReading::default();
        }

        let memory = sys.process(pid).map(|process| process.memory());
        to_reading(memory, thread_count())
    }
}

#[cfg(unix)]
fn thread_count() -> Option<usize> {
    std::fs::read_dir("/proc/self/task")
        .ok()
        .map(|entries| entries.count())
}

#[cfg(not(unix))]
fn thread_count() -> Option<usize> {
    None
}

fn to_reading(memory_bytes: Option<u64>, threads: Option<usize>) -> RuntimeReading {
    RuntimeReading {
        allocated_bytes: memory_bytes
            .map(|bytes| i64::try_from(bytes).unwrap_or(i64::MAX))
            .unwrap_or(0),
        workers: threads
            .map(|n| i64::try_from(n).unwrap_or(i64::MAX))
            .unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_values_read_as_zero() {
        assert_eq!(to_reading(None, None), RuntimeReading::default());
    }

    #[test]
    fn oversized_memory_saturates() {
        let reading = to_reading(Some(u64::MAX), Some(3));
        assert_eq!(reading.allocated_bytes, i64::MAX);
        assert_eq!(reading.workers, 3);
    }

    #[test]
    fn process_memory_is_reported() {
        let reading = ProcessStats.read();
        assert!(reading.allocated_bytes > 0);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn process_threads_on_linux() {
        let reading = ProcessStats.read();
        assert!(reading.workers >= 1);
    }
}
