//! The standard ZP-coder adaptation table.
//!
//! Each entry holds the LPS probability `p`, the MPS adaptation threshold `m`
//! and the successor states after an MPS (`up`) or an LPS (`dn`). States come
//! in pairs whose low bit is the most probable symbol.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZpTableEntry {
    pub p: u16,
    pub m: u16,
    pub up: u8,
    pub dn: u8,
}

const fn e(p: u16, m: u16, up: u8, dn: u8) -> ZpTableEntry {
    ZpTableEntry { p, m, up, dn }
}

/// Number of meaningful states; the remaining entries of a 256-slot table are unused.
pub const ZP_TABLE_LEN: usize = 251;

#[rustfmt::skip]
pub const DEFAULT_ZP_TABLE: [ZpTableEntry; ZP_TABLE_LEN] = [
    e(0x8000, 0x0000,  84, 145), // 000
    e(0x8000, 0x0000,   3,   4), // 001
    e(0x8000, 0x0000,   4,   3), // 002
    e(0x6bbd, 0x10a5,   5,   1), // 003
    e(0x6bbd, 0x10a5,   6,   2), // 004
    e(0x5d45, 0x1f28,   7,   3), // 005
    e(0x5d45, 0x1f28,   8,   4), // 006
    e(0x51b9, 0x2bd3,   9,   5), // 007
    e(0x51b9, 0x2bd3,  10,   6), // 008
    e(0x4813, 0x36e3,  11,   7), // 009
    e(0x4813, 0x36e3,  12,   8), // 010
    e(0x3fd5, 0x408c,  13,   9), // 011
    e(0x3fd5, 0x408c,  14,  10), // 012
    e(0x38b1, 0x48fd,  15,  11), // 013
    e(0x38b1, 0x48fd,  16,  12), // 014
    e(0x3275, 0x505d,  17,  13), // 015
    e(0x3275, 0x505d,  18,  14), // 016
    e(0x2cfd, 0x56d0,  19,  15), // 017
    e(0x2cfd, 0x56d0,  20,  16), // 018
    e(0x2825, 0x5c71,  21,  17), // 019
    e(0x2825, 0x5c71,  22,  18), // 020
    e(0x23ab, 0x615b,  23,  19), // 021
    e(0x23ab, 0x615b,  24,  20), // 022
    e(0x1f87, 0x65a5,  25,  21), // 023
    e(0x1f87, 0x65a5,  26,  22), // 024
    e(0x1bbb, 0x6962,  27,  23), // 025
    e(0x1bbb, 0x6962,  28,  24), // 026
    e(0x1845, 0x6ca2,  29,  25), // 027
    e(0x1845, 0x6ca2,  30,  26), // 028
    e(0x1523, 0x6f74,  31,  27), // 029
    e(0x1523, 0x6f74,  32,  28), // 030
    e(0x1253, 0x71e6,  33,  29), // 031
    e(0x1253, 0x71e6,  34,  30), // 032
    e(0x0fcf, 0x7404,  35,  31), // 033
    e(0x0fcf, 0x7404,  36,  32), // 034
    e(0x0d95, 0x75d6,  37,  33), // 035
    e(0x0d95, 0x75d6,  38,  34), // 036
    e(0x0b9d, 0x7768,  39,  35), // 037
    e(0x0b9d, 0x7768,  40,  36), // 038
    e(0x09e3, 0x78c2,  41,  37), // 039
    e(0x09e3, 0x78c2,  42,  38), // 040
    e(0x0861, 0x79ea,  43,  39), // 041
    e(0x0861, 0x79ea,  44,  40), // 042
    e(0x0711, 0x7ae7,  45,  41), // 043
    e(0x0711, 0x7ae7,  46,  42), // 044
    e(0x05f1, 0x7bbe,  47,  43), // 045
    e(0x05f1, 0x7bbe,  48,  44), // 046
    e(0x04f9, 0x7c75,  49,  45), // 047
    e(0x04f9, 0x7c75,  50,  46), // 048
    e(0x0425, 0x7d0f,  51,  47), // 049
    e(0x0425, 0x7d0f,  52,  48), // 050
    e(0x0371, 0x7d91,  53,  49), // 051
    e(0x0371, 0x7d91,  54,  50), // 052
    e(0x02d9, 0x7dfe,  55,  51), // 053
    e(0x02d9, 0x7dfe,  56,  52), // 054
    e(0x0259, 0x7e5a,  57,  53), // 055
    e(0x0259, 0x7e5a,  58,  54), // 056
    e(0x01ed, 0x7ea6,  59,  55), // 057
    e(0x01ed, 0x7ea6,  60,  56), // 058
    e(0x0193, 0x7ee6,  61,  57), // 059
    e(0x0193, 0x7ee6,  62,  58), // 060
    e(0x0149, 0x7f1a,  63,  59), // 061
    e(0x0149, 0x7f1a,  64,  60), // 062
    e(0x010b, 0x7f45,  65,  61), // 063
    e(0x010b, 0x7f45,  66,  62), // 064
    e(0x00d5, 0x7f6b,  67,  63), // 065
    e(0x00d5, 0x7f6b,  68,  64), // 066
    e(0x00a5, 0x7f8d,  69,  65), // 067
    e(0x00a5, 0x7f8d,  70,  66), // 068
    e(0x007b, 0x7faa,  71,  67), // 069
    e(0x007b, 0x7faa,  72,  68), // 070
    e(0x0057, 0x7fc3,  73,  69), // 071
    e(0x0057, 0x7fc3,  74,  70), // 072
    e(0x003b, 0x7fd7,  75,  71), // 073
    e(0x003b, 0x7fd7,  76,  72), // 074
    e(0x0023, 0x7fe7,  77,  73), // 075
    e(0x0023, 0x7fe7,  78,  74), // 076
    e(0x0013, 0x7ff2,  79,  75), // 077
    e(0x0013, 0x7ff2,  80,  76), // 078
    e(0x0007, 0x7ffa,  81,  77), // 079
    e(0x0007, 0x7ffa,  82,  78), // 080
    e(0x0001, 0x7fff,  81,  79), // 081
    e(0x0001, 0x7fff,  82,  80), // 082
    e(0x5695, 0x0000,   9,  85), // 083
    e(0x24ee, 0x0000,  86, 226), // 084
    e(0x8000, 0x0000,   5,   6), // 085
    e(0x0d30, 0x0000,  88, 176), // 086
    e(0x481a, 0x0000,  89, 143), // 087
    e(0x0481, 0x0000,  90, 138), // 088
    e(0x3579, 0x0000,  91, 141), // 089
    e(0x017a, 0x0000,  92, 112), // 090
    e(0x24ef, 0x0000,  93, 135), // 091
    e(0x007b, 0x0000,  94, 104), // 092
    e(0x1978, 0x0000,  95, 133), // 093
    e(0x0028, 0x0000,  96, 100), // 094
    e(0x10ca, 0x0000,  97, 129), // 095
    e(0x000d, 0x0000,  82,  98), // 096
    e(0x0b5d, 0x0000,  99, 127), // 097
    e(0x0034, 0x0000,  76,  72), // 098
    e(0x078a, 0x0000, 101, 125), // 099
    e(0x00a0, 0x0000,  70, 102), // 100
    e(0x050f, 0x0000, 103, 123), // 101
    e(0x0117, 0x0000,  66,  60), // 102
    e(0x0358, 0x0000, 105, 121), // 103
    e(0x01ea, 0x0000, 106, 110), // 104
    e(0x0234, 0x0000, 107, 119), // 105
    e(0x0144, 0x0000,  66, 108), // 106
    e(0x0173, 0x0000, 109, 117), // 107
    e(0x0234, 0x0000,  60,  54), // 108
    e(0x00f5, 0x0000, 111, 115), // 109
    e(0x0353, 0x0000,  56,  48), // 110
    e(0x00a1, 0x0000,  69, 113), // 111
    e(0x05c5, 0x0000, 114, 134), // 112
    e(0x011a, 0x0000,  65,  59), // 113
    e(0x03cf, 0x0000, 116, 132), // 114
    e(0x01aa, 0x0000,  61,  55), // 115
    e(0x0285, 0x0000, 118, 130), // 116
    e(0x0286, 0x0000,  57,  51), // 117
    e(0x01ab, 0x0000, 120, 128), // 118
    e(0x03d3, 0x0000,  53,  47), // 119
    e(0x011a, 0x0000, 122, 126), // 120
    e(0x05c5, 0x0000,  49,  41), // 121
    e(0x00ba, 0x0000, 124,  62), // 122
    e(0x08ad, 0x0000,  43,  37), // 123
    e(0x007a, 0x0000,  72,  66), // 124
    e(0x0ccc, 0x0000,  39,  31), // 125
    e(0x01eb, 0x0000,  60,  54), // 126
    e(0x1302, 0x0000,  33,  25), // 127
    e(0x02e6, 0x0000,  56,  50), // 128
    e(0x1b81, 0x0000,  29, 131), // 129
    e(0x045e, 0x0000,  52,  46), // 130
    e(0x24ef, 0x0000,  23,  17), // 131
    e(0x0690, 0x0000,  48,  40), // 132
    e(0x2865, 0x0000,  23,  15), // 133
    e(0x09de, 0x0000,  42, 136), // 134
    e(0x3987, 0x0000, 137,   7), // 135
    e(0x0dc8, 0x0000,  38,  32), // 136
    e(0x2c99, 0x0000,  21, 139), // 137
    e(0x10ca, 0x0000, 140, 172), // 138
    e(0x3b5f, 0x0000,  15,   9), // 139
    e(0x0b5d, 0x0000, 142, 170), // 140
    e(0x5695, 0x0000,   9,  85), // 141
    e(0x078a, 0x0000, 144, 168), // 142
    e(0x8000, 0x0000, 141, 248), // 143
    e(0x050f, 0x0000, 146, 166), // 144
    e(0x24ee, 0x0000, 147, 247), // 145
    e(0x0358, 0x0000, 148, 164), // 146
    e(0x0d30, 0x0000, 149, 197), // 147
    e(0x0234, 0x0000, 150, 162), // 148
    e(0x0481, 0x0000, 151,  95), // 149
    e(0x0173, 0x0000, 152, 160), // 150
    e(0x017a, 0x0000, 153, 173), // 151
    e(0x00f5, 0x0000, 154, 158), // 152
    e(0x007b, 0x0000, 155, 165), // 153
    e(0x00a1, 0x0000,  70, 156), // 154
    e(0x0028, 0x0000, 157, 161), // 155
    e(0x011a, 0x0000,  66,  60), // 156
    e(0x000d, 0x0000,  81, 159), // 157
    e(0x01aa, 0x0000,  62,  56), // 158
    e(0x0034, 0x0000,  75,  71), // 159
    e(0x0286, 0x0000,  58,  52), // 160
    e(0x00a0, 0x0000,  69, 163), // 161
    e(0x03d3, 0x0000,  54,  48), // 162
    e(0x0117, 0x0000,  65,  59), // 163
    e(0x05c5, 0x0000,  50,  42), // 164
    e(0x01ea, 0x0000, 167, 171), // 165
    e(0x08ad, 0x0000,  44,  38), // 166
    e(0x0144, 0x0000,  65, 169), // 167
    e(0x0ccc, 0x0000,  40,  32), // 168
    e(0x0234, 0x0000,  59,  53), // 169
    e(0x1302, 0x0000,  34,  26), // 170
    e(0x0353, 0x0000,  55,  47), // 171
    e(0x1b81, 0x0000,  30, 174), // 172
    e(0x05c5, 0x0000, 175, 193), // 173
    e(0x24ef, 0x0000,  24,  18), // 174
    e(0x03cf, 0x0000, 177, 191), // 175
    e(0x2b74, 0x0000, 178, 222), // 176
    e(0x0285, 0x0000, 179, 189), // 177
    e(0x201d, 0x0000, 180, 218), // 178
    e(0x01ab, 0x0000, 181, 187), // 179
    e(0x1715, 0x0000, 182, 216), // 180
    e(0x011a, 0x0000, 183, 185), // 181
    e(0x0fb7, 0x0000, 184, 214), // 182
    e(0x00ba, 0x0000,  69,  61), // 183
    e(0x0a67, 0x0000, 186, 212), // 184
    e(0x01eb, 0x0000,  59,  53), // 185
    e(0x06e7, 0x0000, 188, 210), // 186
    e(0x02e6, 0x0000,  55,  49), // 187
    e(0x0496, 0x0000, 190, 208), // 188
    e(0x045e, 0x0000,  51,  45), // 189
    e(0x030d, 0x0000, 192, 206), // 190
    e(0x0690, 0x0000,  47,  39), // 191
    e(0x0206, 0x0000, 194, 204), // 192
    e(0x09de, 0x0000,  41, 195), // 193
    e(0x0155, 0x0000, 196, 202), // 194
    e(0x0dc8, 0x0000,  37,  31), // 195
    e(0x00e1, 0x0000, 198, 200), // 196
    e(0x2b74, 0x0000, 199, 243), // 197
    e(0x0094, 0x0000,  72,  64), // 198
    e(0x201d, 0x0000, 201, 239), // 199
    e(0x0188, 0x0000,  62,  56), // 200
    e(0x1715, 0x0000, 203, 237), // 201
    e(0x0252, 0x0000,  58,  52), // 202
    e(0x0fb7, 0x0000, 205, 235), // 203
    e(0x0383, 0x0000,  54,  48), // 204
    e(0x0a67, 0x0000, 207, 233), // 205
    e(0x0547, 0x0000,  50,  44), // 206
    e(0x06e7, 0x0000, 209, 231), // 207
    e(0x07e2, 0x0000,  46,  38), // 208
    e(0x0496, 0x0000, 211, 229), // 209
    e(0x0bc0, 0x0000,  40,  34), // 210
    e(0x030d, 0x0000, 213, 227), // 211
    e(0x1178, 0x0000,  36,  28), // 212
    e(0x0206, 0x0000, 215, 225), // 213
    e(0x19da, 0x0000,  30,  22), // 214
    e(0x0155, 0x0000, 217, 223), // 215
    e(0x24ef, 0x0000,  26,  16), // 216
    e(0x00e1, 0x0000, 219, 221), // 217
    e(0x320e, 0x0000,  20, 220), // 218
    e(0x0094, 0x0000,  71,  63), // 219
    e(0x432a, 0x0000,  14,   8), // 220
    e(0x0188, 0x0000,  61,  55), // 221
    e(0x447d, 0x0000,  14, 224), // 222
    e(0x0252, 0x0000,  57,  51), // 223
    e(0x5ece, 0x0000,   8,   2), // 224
    e(0x0383, 0x0000,  53,  47), // 225
    e(0x8000, 0x0000, 228,  87), // 226
    e(0x0547, 0x0000,  49,  43), // 227
    e(0x481a, 0x0000, 230, 246), // 228
    e(0x07e2, 0x0000,  45,  37), // 229
    e(0x3579, 0x0000, 232, 244), // 230
    e(0x0bc0, 0x0000,  39,  33), // 231
    e(0x24ef, 0x0000, 234, 238), // 232
    e(0x1178, 0x0000,  35,  27), // 233
    e(0x1978, 0x0000, 138, 236), // 234
    e(0x19da, 0x0000,  29,  21), // 235
    e(0x2865, 0x0000,  24,  16), // 236
    e(0x24ef, 0x0000,  25,  15), // 237
    e(0x3987, 0x0000, 240,   8), // 238
    e(0x320e, 0x0000,  19, 241), // 239
    e(0x2c99, 0x0000,  22, 242), // 240
    e(0x432a, 0x0000,  13,   7), // 241
    e(0x3b5f, 0x0000,  16,  10), // 242
    e(0x447d, 0x0000,  13, 245), // 243
    e(0x5695, 0x0000,  10,   2), // 244
    e(0x5ece, 0x0000,   7,   1), // 245
    e(0x8000, 0x0000, 244,  83), // 246
    e(0x8000, 0x0000, 249, 250), // 247
    e(0x5695, 0x0000,  10,   2), // 248
    e(0x481a, 0x0000,  89, 143), // 249
    e(0x481a, 0x0000, 230, 246), // 250
];
