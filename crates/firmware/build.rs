//! Places the workspace `memory.x` on the linker search path for the
//! STM32H743ZI target: 2 MiB flash at 0x0800_0000, 128 KiB DTCM at
//! 0x2000_0000 (stack, .data and .bss) and 512 KiB AXI SRAM at 0x2400_0000.
//!
//! Host builds (mocks and tests) skip the linker script entirely.

fn main() -> std::io::Result<()> {
    println!("cargo:rerun-if-changed=build.rs");

    #[cfg(feature = "hardware")]
    {
        use std::path::PathBuf;

        let Some(out_dir) = std::env::var_os("OUT_DIR") else {
            return Err(std::io::Error::other("OUT_DIR not set by cargo"));
        };
        let out = PathBuf::from(out_dir);
        std::fs::write(out.join("memory.x"), include_bytes!("../../memory.x"))?;

        println!("cargo:rustc-link-search={}", out.display());
        println!("cargo:rerun-if-changed=../../memory.x");
    }

    Ok(())
}
