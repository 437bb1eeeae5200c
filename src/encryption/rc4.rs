/// The RC4 stream cipher. Encryption and decryption are the same operation
#[derive(Clone)]
pub(crate) struct Rc4 {
    a: u8,
    b: u8,
    s: [u8; 256],
}

impl Rc4 {
    pub fn new(key: &[u8]) -> Self {
        let mut s = [0_u8; 256];

        for (i, s) in s.iter_mut().enumerate() {
            *s = i as u8;
        }

        if !key.is_empty() {
            let mut j = 0_u8;
            for i in 0..256 {
                j = j.wrapping_add(s[i]).wrapping_add(key[i % key.len()]);
                s.swap(i, j as usize);
            }
        }

        Self { a: 0, b: 0, s }
    }

    pub fn apply(&mut self, data: &[u8]) -> Vec<u8> {
        data.iter()
            .map(|&byte| {
                self.a = self.a.wrapping_add(1);
                let x = self.s[self.a as usize];
                self.b = self.b.wrapping_add(x);
                let y = self.s[self.b as usize];
                self.s.swap(self.a as usize, self.b as usize);

                byte ^ self.s[x.wrapping_add(y) as usize]
            })
            .collect()
    }
}

pub(crate) fn rc4(key: &[u8], data: &[u8]) -> Vec<u8> {
    Rc4::new(key).apply(data)
}
