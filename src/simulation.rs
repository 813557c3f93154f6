// src/simulation.rs
//! Recorded NMEA paragraphs used when no receiver is attached

/// Four consecutive one-second epochs from a receiver near Suwon, KR.
///
/// Each paragraph has one GGA sentence; the RMC and GLL sentences report a
/// slightly different position and must not be mistaken for the fix.
pub const PARAGRAPHS: [&str; 4] = [
    "$GPRMC,123456.00,A,3734.0160,N,12643.3440,E,0.0,0.0,180923,,*30\n\
     $GPGGA,123456.00,3712.4058,N,12644.0063,E,1,08,1.0,100.0,M,50.0,M,,*68\n\
     $GPVTG,0.0,T,0.0,M,0.0,N,0.0,K*4E\n\
     $GPGLL,3734.0160,N,12643.3440,E,123456.00,A*06",
    "$GPGGA,123457.00,3712.4071,N,12644.0164,E,1,08,1.0,100.0,M,50.0,M,,*64\n\
     $GPRMC,123457.00,A,3734.0157,N,12643.3442,E,0.0,0.0,180923,,*37\n\
     $GPVTG,0.0,T,0.0,M,0.0,N,0.0,K*4E\n\
     $GPGLL,3734.0157,N,12643.3442,E,123457.00,A*01",
    "$GPGGA,123458.00,3712.4138,N,12644.0069,E,1,08,1.0,100.0,M,50.0,M,,*6B\n\
     $GPRMC,123458.00,A,3734.0152,N,12643.3438,E,0.0,0.0,180923,,*30\n\
     $GPVTG,0.0,T,0.0,M,0.0,N,0.0,K*4E\n\
     $GPGLL,3734.0152,N,12643.3438,E,123458.00,A*06",
    "$GPGGA,123459.00,3712.4131,N,12644.0238,E,1,08,1.0,100.0,M,50.0,M,,*65\n\
     $GPRMC,123459.00,A,3734.0159,N,12643.3437,E,0.0,0.0,180923,,*35\n\
     $GPVTG,0.0,T,0.0,M,0.0,N,0.0,K*4E\n\
     $GPGLL,3734.0159,N,12643.3437,E,123459.00,A*03",
];
