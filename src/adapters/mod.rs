// Adapters layer: concrete implementations for external systems (search service, XML, filesystem)

pub mod blast_xml;
pub mod ncbi;
pub mod storage;
