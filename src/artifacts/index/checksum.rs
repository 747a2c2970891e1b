use crate::artifacts::index::CHECKSUM_SIZE;
use crate::errors::UgitError;
use anyhow::anyhow;
use bytes::Bytes;
use sha1::{Digest, Sha1};
use std::io::{Read, Write};

/// Reader/writer that hashes every byte passing through it
///
/// Wraps the locked index file; the trailing checksum is verified on read and appended on write.
#[derive(Debug)]
pub struct Checksum<F> {
    file: F,
    digest: Sha1,
}

impl<F> Checksum<F> {
    pub fn new(file: F) -> Self {
        Checksum {
            file,
            digest: Sha1::new(),
        }
    }
}

impl<F: Read> Checksum<F> {
    pub fn read(&mut self, size: usize) -> anyhow::Result<Bytes> {
        let mut buffer = vec![0; size];
        self.file
            .read_exact(&mut buffer)
            .map_err(|_| UgitError::corrupt("index", "unexpected end of file"))?;

        self.digest.update(&buffer);
        Ok(Bytes::from(buffer))
    }

    /// Compare the stored trailer against the digest of everything read so far
    pub fn verify(&mut self) -> anyhow::Result<()> {
        let mut expected_checksum = [0u8; CHECKSUM_SIZE];
        self.file
            .read_exact(&mut expected_checksum)
            .map_err(|_| UgitError::corrupt("index", "missing checksum"))?;

        let mut trailing = Vec::new();
        self.file.read_to_end(&mut trailing)?;
        if !trailing.is_empty() {
            return Err(UgitError::corrupt("index", "unexpected data after checksum").into());
        }

        let actual_checksum = self.digest.clone().finalize();
        if expected_checksum != actual_checksum.as_slice() {
            return Err(UgitError::corrupt("index", "checksum does not match contents").into());
        }

        Ok(())
    }
}

impl<F: Write> Checksum<F> {
    pub fn write(&mut self, data: &[u8]) -> anyhow::Result<()> {
        self.file.write_all(data)?;
        self.digest.update(data);
        Ok(())
    }

    pub fn write_checksum(&mut self) -> anyhow::Result<()> {
        let checksum = self.digest.clone().finalize();
        self.file
            .write_all(checksum.as_slice())
            .map_err(|_| anyhow!("Failed to write checksum to index file"))?;
        self.file.flush()?;

        Ok(())
    }
}
