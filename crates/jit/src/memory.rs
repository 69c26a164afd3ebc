//! Executable memory lifecycle: register file, code staging, sealing.
//!
//! The code region moves through two states, each its own type:
//!
//! ```text
//! StagingCode (read+write) --seal()--> SealedCode (read+execute)
//! ```
//!
//! `seal` consumes the staging region, so no value ever grants write and
//! execute access to the same mapping. Both regions are anonymous mappings,
//! zero-filled, and unmapped on drop.

use std::io;
use std::ptr::{self, NonNull};

use log::{debug, warn};

use cvm_common::REGISTER_COUNT;

use crate::error::JitError;

/// Bytes mapped for the register file.
pub const REGISTER_FILE_BYTES: usize = 0x1000;

/// An owned anonymous mapping.
struct Mapping {
    ptr: NonNull<u8>,
    len: usize,
}

impl Mapping {
    fn new(len: usize, region: &'static str) -> Result<Self, JitError> {
        let failure = |reason: String| JitError::AllocationFailure { region, reason };
        if len == 0 {
            return Err(failure("zero-length region".to_string()));
        }

        let raw = unsafe {
            libc::mmap(
                ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };
        if raw == libc::MAP_FAILED {
            return Err(failure(io::Error::last_os_error().to_string()));
        }

        let ptr = NonNull::new(raw as *mut u8).ok_or_else(|| failure("null mapping".to_string()))?;
        debug!("mapped {len:#x} byte {region} region at {:p}", ptr);
        Ok(Self { ptr, len })
    }

    fn addr(&self) -> usize {
        self.ptr.as_ptr() as usize
    }
}

impl Drop for Mapping {
    fn drop(&mut self) {
        let rc = unsafe { libc::munmap(self.ptr.as_ptr() as *mut libc::c_void, self.len) };
        if rc != 0 {
            warn!(
                "munmap of {:p} failed: {}",
                self.ptr,
                io::Error::last_os_error()
            );
        }
    }
}

/// The VM register file: `REGISTER_COUNT` 32-bit words, all starting at 0.
///
/// Its address is baked into the generated code, so it stays mapped and in
/// place for the whole execution.
pub struct RegisterFile {
    mapping: Mapping,
}

impl RegisterFile {
    /// Map a fresh, zeroed register file.
    pub fn allocate() -> Result<Self, JitError> {
        Ok(Self {
            mapping: Mapping::new(REGISTER_FILE_BYTES, "register file")?,
        })
    }

    /// Address of register 0.
    pub fn base(&self) -> usize {
        self.mapping.addr()
    }

    /// Copy out the current register values.
    pub fn snapshot(&self) -> [i32; REGISTER_COUNT] {
        let words = self.mapping.ptr.as_ptr() as *const i32;
        let mut out = [0; REGISTER_COUNT];
        for (i, slot) in out.iter_mut().enumerate() {
            // Generated code writes the mapping behind the compiler's back.
            *slot = unsafe { ptr::read_volatile(words.add(i)) };
        }
        out
    }
}

/// A writable, non-executable code region awaiting its contents.
pub struct StagingCode {
    mapping: Mapping,
    written: usize,
}

impl StagingCode {
    /// Map a zeroed, writable code region of `capacity` bytes.
    pub fn allocate(capacity: usize) -> Result<Self, JitError> {
        Ok(Self {
            mapping: Mapping::new(capacity, "code")?,
            written: 0,
        })
    }

    /// Address the code will run at once sealed.
    pub fn base(&self) -> usize {
        self.mapping.addr()
    }

    /// Size of the region in bytes.
    pub fn capacity(&self) -> usize {
        self.mapping.len
    }

    /// Copy `code` verbatim to the start of the region.
    pub fn write(&mut self, code: &[u8]) -> Result<(), JitError> {
        if code.len() > self.mapping.len {
            return Err(JitError::CodeTooLarge {
                needed: code.len(),
                capacity: self.mapping.len,
            });
        }
        unsafe {
            ptr::copy_nonoverlapping(code.as_ptr(), self.mapping.ptr.as_ptr(), code.len());
        }
        self.written = code.len();
        Ok(())
    }

    /// Drop write access and add execute access.
    pub fn seal(self) -> Result<SealedCode, JitError> {
        let rc = unsafe {
            libc::mprotect(
                self.mapping.ptr.as_ptr() as *mut libc::c_void,
                self.mapping.len,
                libc::PROT_READ | libc::PROT_EXEC,
            )
        };
        if rc != 0 {
            return Err(JitError::ProtectionFailure {
                reason: io::Error::last_os_error().to_string(),
            });
        }

        debug!("sealed {} bytes at {:#x}", self.written, self.base());
        Ok(SealedCode {
            mapping: self.mapping,
        })
    }
}

/// A read+execute code region whose first byte is the entry point.
pub struct SealedCode {
    mapping: Mapping,
}

impl SealedCode {
    /// Address of the entry point.
    pub fn entry(&self) -> usize {
        self.mapping.addr()
    }

    /// Call the entry point as a zero-argument C function.
    ///
    /// Returns when the generated code executes HALT (or an unbalanced RET
    /// that happens to unwind to the host).
    ///
    /// # Safety
    ///
    /// The region must hold code produced by the encoder for this process,
    /// with a register file that is still mapped. Traps in the generated
    /// code (division by zero, a RET without a CALL) terminate the process.
    #[cfg(target_arch = "x86_64")]
    pub unsafe fn invoke(&self) {
        let entry: extern "C" fn() = std::mem::transmute(self.mapping.ptr.as_ptr());
        entry();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_file_starts_zeroed() {
        let regs = RegisterFile::allocate().unwrap();
        assert_eq!(regs.snapshot(), [0; REGISTER_COUNT]);
        assert_ne!(regs.base(), 0);
    }

    #[test]
    fn register_file_holds_every_register() {
        assert!(REGISTER_COUNT * 4 <= REGISTER_FILE_BYTES);
    }

    #[test]
    fn staging_rejects_oversized_code() {
        let mut staging = StagingCode::allocate(16).unwrap();
        assert_eq!(
            staging.write(&[0xC3; 17]),
            Err(JitError::CodeTooLarge {
                needed: 17,
                capacity: 16
            })
        );
    }

    #[test]
    fn zero_capacity_is_an_allocation_failure() {
        assert!(matches!(
            StagingCode::allocate(0),
            Err(JitError::AllocationFailure { region: "code", .. })
        ));
    }

    #[test]
    fn seal_keeps_the_address() {
        let mut staging = StagingCode::allocate(4096).unwrap();
        let base = staging.base();
        staging.write(&[0xC3]).unwrap();
        let sealed = staging.seal().unwrap();
        assert_eq!(sealed.entry(), base);
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn invoke_bare_ret() {
        let mut staging = StagingCode::allocate(4096).unwrap();
        staging.write(&[0xC3]).unwrap();
        let sealed = staging.seal().unwrap();
        unsafe { sealed.invoke() };
    }
}
