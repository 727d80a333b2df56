//! i.MX UART driver for the boot console
//!
//! Output only. The bootloader has already configured baud rate and
//! enabled the transmitter; this driver just feeds the TX FIFO.
//!
//! # Memory Map
//! - UART1 base: 0x0202_0000, inside the 1 MiB console MMIO window at
//!   0x0200_0000 that stays identity-mapped after translation is on

use core::fmt::{self, Write};
use spin::Mutex;

/// UART1 base address
const UART_BASE: usize = 0x0202_0000;

/// Register offsets
mod regs {
    /// Transmitter register
    pub const UTXD: usize = 0x40;
    /// Test register (holds the FIFO status bits)
    pub const UTS: usize = 0xB4;
}

/// UTS bits
mod flags {
    /// Transmit FIFO full
    pub const TXFULL: u32 = 1 << 4;
}

/// Console UART
pub struct Uart {
    base: usize,
    initialized: bool,
}

impl Uart {
    /// Create a new UART instance (not yet initialized)
    pub const fn new(base: usize) -> Self {
        Self {
            base,
            initialized: false,
        }
    }

    /// Initialize the UART
    ///
    /// # Safety
    /// The base address must be a live, enabled UART reachable at that
    /// address, both now and after translation is switched on.
    pub unsafe fn init(&mut self) {
        self.initialized = true;
    }

    fn write_byte(&self, byte: u8) {
        if !self.initialized {
            return;
        }

        // SAFETY: Base address is validated by the caller of init().
        unsafe {
            let uts = (self.base + regs::UTS) as *const u32;
            let utxd = (self.base + regs::UTXD) as *mut u32;

            while core::ptr::read_volatile(uts) & flags::TXFULL != 0 {
                core::hint::spin_loop();
            }

            core::ptr::write_volatile(utxd, byte as u32);
        }
    }

    /// Write a string to the UART
    pub fn write_str(&self, s: &str) {
        for byte in s.bytes() {
            if byte == b'\n' {
                self.write_byte(b'\r');
            }
            self.write_byte(byte);
        }
    }
}

impl Write for Uart {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        Uart::write_str(self, s);
        Ok(())
    }
}

/// Global UART instance protected by spinlock
pub static UART: Mutex<Uart> = Mutex::new(Uart::new(UART_BASE));

/// Print macro for kernel output
#[macro_export]
macro_rules! kprint {
    ($($arg:tt)*) => {{
        use core::fmt::Write;
        let mut uart = $crate::drivers::uart::UART.lock();
        let _ = write!(uart, $($arg)*);
    }};
}

/// Println macro for kernel output
#[macro_export]
macro_rules! kprintln {
    () => {
        $crate::kprint!("\n")
    };
    ($($arg:tt)*) => {{
        $crate::kprint!($($arg)*);
        $crate::kprint!("\n");
    }};
}
