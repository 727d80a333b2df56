//! Bare-metal entry point and panic handler.

use core::arch::global_asm;
use core::panic::PanicInfo;

use log::{info, LevelFilter};
use sectionboot::arch::armv7::Cp15;
use sectionboot::exception::{ExceptionVector, BRANCH_TO_SELF};
use sectionboot::mm::{IdentityMemory, KernelImage, MemoryLayout, PhysAddr};
use sectionboot::BootContext;

use crate::drivers::uart::UART;
use crate::{kprintln, logger};

global_asm!(include_str!("boot.S"));

/// Kernel version string
const VERSION: &str = env!("CARGO_PKG_VERSION");

extern "C" {
    static __kernel_start: u8;
    static __kernel_end: u8;
}

/// Bounds of the loaded image, including its stack and bss.
fn kernel_image() -> KernelImage {
    // SAFETY: Only the addresses of the linker symbols are taken.
    let (start, end) = unsafe {
        (
            (&raw const __kernel_start) as usize as u32,
            (&raw const __kernel_end) as usize as u32,
        )
    };
    KernelImage::new(PhysAddr::new(start), end - start)
}

/// Kernel entry point called from boot.S
///
/// Runs on the boot CPU in SVC mode with interrupts masked, translation
/// off, stack and bss set up.
#[no_mangle]
pub extern "C" fn kernel_main() -> ! {
    // SAFETY: The console UART is enabled by the bootloader and is
    // reachable at its physical address while translation is off.
    unsafe {
        UART.lock().init();
    }
    logger::init(LevelFilter::Debug);

    kprintln!();
    kprintln!("sectionboot v{} - ARMv7 section-mapped boot", VERSION);
    kprintln!();

    let layout = MemoryLayout::new(kernel_image());

    // SAFETY: Translation is off, so every physical address is reachable
    // as-is, and the boot path is the only user of the memory it touches.
    let mem = unsafe { IdentityMemory::new() };
    let mut ctx = BootContext::mem_init(layout, mem);

    // Park every exception until real handlers are installed.
    for vector in ExceptionVector::ALL {
        ctx.set_vector(vector, BRANCH_TO_SELF);
    }

    // SAFETY: SVC mode, boot CPU, interrupts masked (boot.S).
    let mut cp15 = unsafe { Cp15::new() };
    let space = ctx.map_kernel_address_space(&mut cp15);

    info!(
        "[BOOT] translation on, {} of {} frames free",
        space.pages().free_frames(),
        space.pages().len()
    );
    halt();
}

/// Halt the CPU in a low-power state
fn halt() -> ! {
    loop {
        // SAFETY: WFI is always safe to execute
        unsafe {
            core::arch::asm!("wfi", options(nostack, nomem));
        }
    }
}

/// Panic handler - called on unrecoverable errors
#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    kprintln!();
    kprintln!("!!! KERNEL PANIC !!!");

    if let Some(location) = info.location() {
        kprintln!(
            "Location: {}:{}:{}",
            location.file(),
            location.line(),
            location.column()
        );
    }

    kprintln!("Message: {}", info.message());
    kprintln!("System halted.");

    halt();
}
