//! Pre-built mock host scenarios for testing.
//!
//! These provide a realistic `/proc`, `/sys` and command-output state for a
//! small four-core VM with one USB receiver attached.

use super::commands::MockCommands;
use super::filesystem::MockFs;

impl MockFs {
    /// Creates a typical host with every source the collector reads.
    pub fn typical_system() -> Self {
        let mut fs = Self::new();

        fs.add_file("/proc/uptime", "12345.67 98765.43\n");
        fs.add_file("/proc/loadavg", "0.15 0.10 0.05 1/150 1234\n");
        fs.add_file(
            "/proc/meminfo",
            "\
MemTotal:       16384000 kB
MemFree:         8192000 kB
MemAvailable:   12000000 kB
Buffers:          512000 kB
Cached:          2048000 kB
SwapCached:            0 kB
SwapTotal:       4096000 kB
SwapFree:        4096000 kB
Dirty:              1024 kB
HugePages_Total:       0
HugePages_Free:        0
Hugepagesize:       2048 kB
",
        );
        fs.add_file(
            "/proc/stat",
            "\
cpu  10000 500 3000 80000 1000 200 100 0 0 0
cpu0 2500 125 750 20000 250 50 25 0 0 0
cpu1 2500 125 750 20000 250 50 25 0 0 0
cpu2 2500 125 750 20000 250 50 25 0 0 0
cpu3 2500 125 750 20000 250 50 25 0 0 0
intr 1000000 50 0 0 0 0 0 0 0 1 0 0 0 100 0 0 1000
ctxt 500000
btime 1700000000
processes 10000
procs_running 2
procs_blocked 0
",
        );
        fs.add_file(
            "/proc/mounts",
            "\
/dev/sda1 / ext4 rw,relatime,errors=remount-ro 0 0
proc /proc proc rw,nosuid,nodev,noexec,relatime 0 0
sysfs /sys sysfs rw,nosuid,nodev,noexec,relatime 0 0
tmpfs /run tmpfs rw,nosuid,nodev,size=1638400k,mode=755 0 0
/dev/sdb1 /data xfs rw,noatime 0 0
",
        );
        fs.add_file(
            "/proc/net/route",
            "\
Iface\tDestination\tGateway \tFlags\tRefCnt\tUse\tMetric\tMask\t\tMTU\tWindow\tIRTT
eth0\t00000000\t0102A8C0\t0003\t0\t0\t100\t00000000\t0\t0\t0
eth0\t0002A8C0\t00000000\t0001\t0\t0\t100\t00FFFFFF\t0\t0\t0
",
        );

        fs.add_dir("/sys/bus/usb/devices");
        fs.add_usb_device("1-1", "Logitech", "USB Receiver", "046d", "c52b");
        // Root hub interface: no identity attributes, skipped by the collector.
        fs.add_file("/sys/bus/usb/devices/1-0:1.0/bInterfaceClass", "09\n");

        fs
    }
}

impl MockCommands {
    /// Command output matching [`MockFs::typical_system`].
    pub fn typical_system() -> Self {
        let mut cmds = Self::new();

        cmds.add_output(
            "df",
            &["-H"],
            "\
Filesystem      Size  Used Avail Use% Mounted on
/dev/sda1       511G  201G  284G  42% /
tmpfs           1.7G  1.2M  1.7G   1% /run
/dev/sdb1       2.0T  1.1T  0.9T  55% /data
",
        );
        cmds.add_output(
            "hostnamectl",
            &[],
            "   Static hostname: node-1
         Icon name: computer-vm
           Chassis: vm
        Machine ID: 0123456789abcdef0123456789abcdef
           Boot ID: fedcba9876543210fedcba9876543210
    Virtualization: kvm
  Operating System: Debian GNU/Linux 12 (bookworm)
            Kernel: Linux 6.1.0-18-amd64
      Architecture: x86-64
",
        );
        cmds.add_output(
            "journalctl",
            &["--list-boots"],
            "\
-1 0f1e2d3c4b5a69788796a5b4c3d2e1f0 Mon 2026-10-12 08:00:01 UTC—Sun 2026-10-18 22:10:00 UTC
 0 00112233445566778899aabbccddeeff Mon 2026-10-19 07:59:30 UTC—Mon 2026-10-19 12:00:00 UTC
",
        );

        cmds
    }
}
