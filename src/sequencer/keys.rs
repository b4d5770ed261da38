// Keys - MIDI note numbers by name, and the chord shapes of the chord machine
//
// Sharps are spelled with an `S` (`CS4`), flats with an `F` (`DF4`). C4 is 60.

// Octave 0
pub const A0: u8 = 21;
pub const AS0: u8 = 22;
pub const BF0: u8 = AS0;
pub const B0: u8 = 23;

// Octave 1
pub const C1: u8 = 24;
pub const CS1: u8 = 25;
pub const DF1: u8 = CS1;
pub const D1: u8 = 26;
pub const DS1: u8 = 27;
pub const EF1: u8 = DS1;
pub const E1: u8 = 28;
pub const F1: u8 = 29;
pub const FS1: u8 = 30;
pub const GF1: u8 = FS1;
pub const G1: u8 = 31;
pub const GS1: u8 = 32;
pub const AF1: u8 = GS1;
pub const A1: u8 = 33;
pub const AS1: u8 = 34;
pub const BF1: u8 = AS1;
pub const B1: u8 = 35;

// Octave 2
pub const C2: u8 = 36;
pub const CS2: u8 = 37;
pub const DF2: u8 = CS2;
pub const D2: u8 = 38;
pub const DS2: u8 = 39;
pub const EF2: u8 = DS2;
pub const E2: u8 = 40;
pub const F2: u8 = 41;
pub const FS2: u8 = 42;
pub const GF2: u8 = FS2;
pub const G2: u8 = 43;
pub const GS2: u8 = 44;
pub const AF2: u8 = GS2;
pub const A2: u8 = 45;
pub const AS2: u8 = 46;
pub const BF2: u8 = AS2;
pub const B2: u8 = 47;

// Octave 3
pub const C3: u8 = 48;
pub const CS3: u8 = 49;
pub const DF3: u8 = CS3;
pub const D3: u8 = 50;
pub const DS3: u8 = 51;
pub const EF3: u8 = DS3;
pub const E3: u8 = 52;
pub const F3: u8 = 53;
pub const FS3: u8 = 54;
pub const GF3: u8 = FS3;
pub const G3: u8 = 55;
pub const GS3: u8 = 56;
pub const AF3: u8 = GS3;
pub const A3: u8 = 57;
pub const AS3: u8 = 58;
pub const BF3: u8 = AS3;
pub const B3: u8 = 59;

// Octave 4
pub const C4: u8 = 60;
pub const CS4: u8 = 61;
pub const DF4: u8 = CS4;
pub const D4: u8 = 62;
pub const DS4: u8 = 63;
pub const EF4: u8 = DS4;
pub const E4: u8 = 64;
pub const F4: u8 = 65;
pub const FS4: u8 = 66;
pub const GF4: u8 = FS4;
pub const G4: u8 = 67;
pub const GS4: u8 = 68;
pub const AF4: u8 = GS4;
pub const A4: u8 = 69;
pub const AS4: u8 = 70;
pub const BF4: u8 = AS4;
pub const B4: u8 = 71;

// Octave 5
pub const C5: u8 = 72;
pub const CS5: u8 = 73;
pub const DF5: u8 = CS5;
pub const D5: u8 = 74;
pub const DS5: u8 = 75;
pub const EF5: u8 = DS5;
pub const E5: u8 = 76;
pub const F5: u8 = 77;
pub const FS5: u8 = 78;
pub const GF5: u8 = FS5;
pub const G5: u8 = 79;
pub const GS5: u8 = 80;
pub const AF5: u8 = GS5;
pub const A5: u8 = 81;
pub const AS5: u8 = 82;
pub const BF5: u8 = AS5;
pub const B5: u8 = 83;

// Octave 6
pub const C6: u8 = 84;
pub const CS6: u8 = 85;
pub const DF6: u8 = CS6;
pub const D6: u8 = 86;
pub const DS6: u8 = 87;
pub const EF6: u8 = DS6;
pub const E6: u8 = 88;
pub const F6: u8 = 89;
pub const FS6: u8 = 90;
pub const GF6: u8 = FS6;
pub const G6: u8 = 91;
pub const GS6: u8 = 92;
pub const AF6: u8 = GS6;
pub const A6: u8 = 93;
pub const AS6: u8 = 94;
pub const BF6: u8 = AS6;
pub const B6: u8 = 95;

// Octave 7
pub const C7: u8 = 96;
pub const CS7: u8 = 97;
pub const DF7: u8 = CS7;
pub const D7: u8 = 98;
pub const DS7: u8 = 99;
pub const EF7: u8 = DS7;
pub const E7: u8 = 100;
pub const F7: u8 = 101;
pub const FS7: u8 = 102;
pub const GF7: u8 = FS7;
pub const G7: u8 = 103;
pub const GS7: u8 = 104;
pub const AF7: u8 = GS7;
pub const A7: u8 = 105;
pub const AS7: u8 = 106;
pub const BF7: u8 = AS7;
pub const B7: u8 = 107;

// Octave 8
pub const C8: u8 = 108;
pub const CS8: u8 = 109;
pub const DF8: u8 = CS8;
pub const D8: u8 = 110;
pub const DS8: u8 = 111;
pub const EF8: u8 = DS8;
pub const E8: u8 = 112;
pub const F8: u8 = 113;
pub const FS8: u8 = 114;
pub const GF8: u8 = FS8;
pub const G8: u8 = 115;
pub const GS8: u8 = 116;
pub const AF8: u8 = GS8;
pub const A8: u8 = 117;
pub const AS8: u8 = 118;
pub const BF8: u8 = AS8;
pub const B8: u8 = 119;

/// Lowest and highest named keys
pub const LOWEST: u8 = A0;
pub const HIGHEST: u8 = B8;

/// Chord shapes, in the order the chord machine's SHAPE parameter selects them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Chord {
    UnisonX2,
    UnisonX3,
    UnisonX4,
    Minor,
    Major,
    Sus2,
    Sus4,
    MinorMinor7,
    MajorMinor7,
    MinorMajor7,
    MajorMajor7,
    MinorMinor7Sus4,
    Dim7,
    MinorAdd9,
    MajorAdd9,
    Minor6,
    Major6,
    MinorFlat5,
    MajorFlat5,
    MinorMinor7Flat5,
    MajorMinor7Flat5,
    MajorAug5,
    MinorMinor7Aug5,
    MajorMinor7Aug5,
    MinorFlat6,
    MinorMinor9No5,
    MajorMinor9No5,
    MajorAdd9Flat5,
    MajorMajor7Flat5,
    MajorMinor7Flat9No5,
    Sus4Aug5Flat9,
    Sus4AddAug5,
    MajorAddFlat5,
    Major6Add4No5,
    MajorMajor76No5,
    MajorMajor9No5,
    Fourths,
    Fifths,
}

impl Chord {
    /// Value to send on `Parameter::SHAPE`
    pub fn value(self) -> u8 {
        self as u8
    }
}

impl From<Chord> for u8 {
    fn from(chord: Chord) -> Self {
        chord.value()
    }
}
