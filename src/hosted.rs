//! Host simulator: the boot memory path against a RAM window in a Vec.

use log::{info, LevelFilter, Log, Metadata, Record};
use sectionboot::mm::{KernelImage, MemoryLayout, PhysAddr, TranslationControl, WindowMemory};
use sectionboot::BootContext;

/// Bytes of RAM simulated from the start of DRAM.
const WINDOW_BYTES: usize = 4 << 20;

/// Kernel image size assumed by the simulation.
const KERNEL_SIZE: u32 = 0x2000;

struct StdoutLogger;

static LOGGER: StdoutLogger = StdoutLogger;

impl Log for StdoutLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            println!("[{}] {}: {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

/// Prints the register loads instead of performing them.
struct TracingControl;

impl TranslationControl for TracingControl {
    fn load_vector_base(&mut self, base: PhysAddr) {
        info!("VBAR <- {}", base);
    }

    fn load_translation_table_base(&mut self, base: PhysAddr) {
        info!("TTBR0 <- {}, MMU on", base);
    }
}

pub fn run() {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }

    let layout = MemoryLayout::new(KernelImage::new(
        PhysAddr::new(sectionboot::mm::layout::RAM_BASE),
        KERNEL_SIZE,
    ));
    let mut words = vec![0u32; WINDOW_BYTES / 4];
    let mem = WindowMemory::new(layout.ram.base, &mut words);

    let ctx = BootContext::mem_init(layout, mem);
    let space = ctx.map_kernel_address_space(&mut TracingControl);

    info!(
        "boot end {}, {} of {} frames free",
        space.boot_end(),
        space.pages().free_frames(),
        space.pages().len()
    );
}
