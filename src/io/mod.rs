/*!
# IO utilities

Reading of the compressed dumps and writing of entity documents.
!*/
pub mod reader;
pub mod writer;
