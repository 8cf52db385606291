pub mod context;
pub mod modrm;
pub mod opcode;
pub mod stream;
