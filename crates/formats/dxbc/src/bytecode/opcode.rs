/// Instruction class, the opcode-type field (bits 0-10) of an instruction token.
///
/// Covers the D3D10, D3D10.1 and D3D11 tokenized program formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum OpcodeType {
    // Arithmetic, logic and flow control (shader model 4.0)
    Add = 0,
    And = 1,
    Break = 2,
    Breakc = 3,
    Call = 4,
    Callc = 5,
    Case = 6,
    Continue = 7,
    Continuec = 8,
    Cut = 9,
    Default = 10,
    DerivRtx = 11,
    DerivRty = 12,
    Discard = 13,
    Div = 14,
    Dp2 = 15,
    Dp3 = 16,
    Dp4 = 17,
    Else = 18,
    Emit = 19,
    Emitthencut = 20,
    Endif = 21,
    Endloop = 22,
    Endswitch = 23,
    Eq = 24,
    Exp = 25,
    Frc = 26,
    Ftoi = 27,
    Ftou = 28,
    Ge = 29,
    Iadd = 30,
    If = 31,
    Ieq = 32,
    Ige = 33,
    Ilt = 34,
    Imad = 35,
    Imax = 36,
    Imin = 37,
    Imul = 38,
    Ine = 39,
    Ineg = 40,
    Ishl = 41,
    Ishr = 42,
    Itof = 43,
    Label = 44,
    Ld = 45,
    LdMs = 46,
    Log = 47,
    Loop = 48,
    Lt = 49,
    Mad = 50,
    Min = 51,
    Max = 52,
    Customdata = 53,
    Mov = 54,
    Movc = 55,
    Mul = 56,
    Ne = 57,
    Nop = 58,
    Not = 59,
    Or = 60,
    Resinfo = 61,
    Ret = 62,
    Retc = 63,
    RoundNe = 64,
    RoundNi = 65,
    RoundPi = 66,
    RoundZ = 67,
    Rsq = 68,
    Sample = 69,
    SampleC = 70,
    SampleCLz = 71,
    SampleL = 72,
    SampleD = 73,
    SampleB = 74,
    Sqrt = 75,
    Switch = 76,
    Sincos = 77,
    Udiv = 78,
    Ult = 79,
    Uge = 80,
    Umul = 81,
    Umad = 82,
    Umax = 83,
    Umin = 84,
    Ushr = 85,
    Utof = 86,
    Xor = 87,

    // Declarations (shader model 4.0)
    DclResource = 88,
    DclConstantBuffer = 89,
    DclSampler = 90,
    DclIndexRange = 91,
    DclGsOutputPrimitiveTopology = 92,
    DclGsInputPrimitive = 93,
    DclMaxOutputVertexCount = 94,
    DclInput = 95,
    DclInputSgv = 96,
    DclInputSiv = 97,
    DclInputPs = 98,
    DclInputPsSgv = 99,
    DclInputPsSiv = 100,
    DclOutput = 101,
    DclOutputSgv = 102,
    DclOutputSiv = 103,
    DclTemps = 104,
    DclIndexableTemp = 105,
    DclGlobalFlags = 106,
    Reserved0 = 107,

    // Shader model 4.1
    Lod = 108,
    Gather4 = 109,
    SamplePos = 110,
    SampleInfo = 111,
    Reserved1 = 112,

    // Hull/domain shader phases and stream output (shader model 5.0)
    HsDecls = 113,
    HsControlPointPhase = 114,
    HsForkPhase = 115,
    HsJoinPhase = 116,
    EmitStream = 117,
    CutStream = 118,
    EmitthencutStream = 119,
    InterfaceCall = 120,

    // Shader model 5.0 arithmetic and resource queries
    Bufinfo = 121,
    DerivRtxCoarse = 122,
    DerivRtxFine = 123,
    DerivRtyCoarse = 124,
    DerivRtyFine = 125,
    Gather4C = 126,
    Gather4Po = 127,
    Gather4PoC = 128,
    Rcp = 129,
    F32tof16 = 130,
    F16tof32 = 131,
    Uaddc = 132,
    Usubb = 133,
    Countbits = 134,
    FirstbitHi = 135,
    FirstbitLo = 136,
    FirstbitShi = 137,
    Ubfe = 138,
    Ibfe = 139,
    Bfi = 140,
    Bfrev = 141,
    Swapc = 142,

    // Shader model 5.0 declarations
    DclStream = 143,
    DclFunctionBody = 144,
    DclFunctionTable = 145,
    DclInterface = 146,
    DclInputControlPointCount = 147,
    DclOutputControlPointCount = 148,
    DclTessDomain = 149,
    DclTessPartitioning = 150,
    DclTessOutputPrimitive = 151,
    DclHsMaxTessfactor = 152,
    DclHsForkPhaseInstanceCount = 153,
    DclHsJoinPhaseInstanceCount = 154,
    DclThreadGroup = 155,
    DclUnorderedAccessViewTyped = 156,
    DclUnorderedAccessViewRaw = 157,
    DclUnorderedAccessViewStructured = 158,
    DclThreadGroupSharedMemoryRaw = 159,
    DclThreadGroupSharedMemoryStructured = 160,
    DclResourceRaw = 161,
    DclResourceStructured = 162,

    // Unordered access views and atomics
    LdUavTyped = 163,
    StoreUavTyped = 164,
    LdRaw = 165,
    StoreRaw = 166,
    LdStructured = 167,
    StoreStructured = 168,
    AtomicAnd = 169,
    AtomicOr = 170,
    AtomicXor = 171,
    AtomicCmpStore = 172,
    AtomicIadd = 173,
    AtomicImax = 174,
    AtomicImin = 175,
    AtomicUmax = 176,
    AtomicUmin = 177,
    ImmAtomicAlloc = 178,
    ImmAtomicConsume = 179,
    ImmAtomicIadd = 180,
    ImmAtomicAnd = 181,
    ImmAtomicOr = 182,
    ImmAtomicXor = 183,
    ImmAtomicExch = 184,
    ImmAtomicCmpExch = 185,
    ImmAtomicImax = 186,
    ImmAtomicImin = 187,
    ImmAtomicUmax = 188,
    ImmAtomicUmin = 189,

    // Synchronization and double precision
    Sync = 190,
    Dadd = 191,
    Dmax = 192,
    Dmin = 193,
    Dmul = 194,
    Deq = 195,
    Dge = 196,
    Dlt = 197,
    Dne = 198,
    Dmov = 199,
    Dmovc = 200,
    Dtof = 201,
    Ftod = 202,

    // Pull-model evaluation
    EvalSnapped = 203,
    EvalSampleIndex = 204,
    EvalCentroid = 205,
    DclGsInstanceCount = 206,
}

/// All opcode types, indexed by their code.
const ALL: [OpcodeType; 207] = [
    OpcodeType::Add,
    OpcodeType::And,
    OpcodeType::Break,
    OpcodeType::Breakc,
    OpcodeType::Call,
    OpcodeType::Callc,
    OpcodeType::Case,
    OpcodeType::Continue,
    OpcodeType::Continuec,
    OpcodeType::Cut,
    OpcodeType::Default,
    OpcodeType::DerivRtx,
    OpcodeType::DerivRty,
    OpcodeType::Discard,
    OpcodeType::Div,
    OpcodeType::Dp2,
    OpcodeType::Dp3,
    OpcodeType::Dp4,
    OpcodeType::Else,
    OpcodeType::Emit,
    OpcodeType::Emitthencut,
    OpcodeType::Endif,
    OpcodeType::Endloop,
    OpcodeType::Endswitch,
    OpcodeType::Eq,
    OpcodeType::Exp,
    OpcodeType::Frc,
    OpcodeType::Ftoi,
    OpcodeType::Ftou,
    OpcodeType::Ge,
    OpcodeType::Iadd,
    OpcodeType::If,
    OpcodeType::Ieq,
    OpcodeType::Ige,
    OpcodeType::Ilt,
    OpcodeType::Imad,
    OpcodeType::Imax,
    OpcodeType::Imin,
    OpcodeType::Imul,
    OpcodeType::Ine,
    OpcodeType::Ineg,
    OpcodeType::Ishl,
    OpcodeType::Ishr,
    OpcodeType::Itof,
    OpcodeType::Label,
    OpcodeType::Ld,
    OpcodeType::LdMs,
    OpcodeType::Log,
    OpcodeType::Loop,
    OpcodeType::Lt,
    OpcodeType::Mad,
    OpcodeType::Min,
    OpcodeType::Max,
    OpcodeType::Customdata,
    OpcodeType::Mov,
    OpcodeType::Movc,
    OpcodeType::Mul,
    OpcodeType::Ne,
    OpcodeType::Nop,
    OpcodeType::Not,
    OpcodeType::Or,
    OpcodeType::Resinfo,
    OpcodeType::Ret,
    OpcodeType::Retc,
    OpcodeType::RoundNe,
    OpcodeType::RoundNi,
    OpcodeType::RoundPi,
    OpcodeType::RoundZ,
    OpcodeType::Rsq,
    OpcodeType::Sample,
    OpcodeType::SampleC,
    OpcodeType::SampleCLz,
    OpcodeType::SampleL,
    OpcodeType::SampleD,
    OpcodeType::SampleB,
    OpcodeType::Sqrt,
    OpcodeType::Switch,
    OpcodeType::Sincos,
    OpcodeType::Udiv,
    OpcodeType::Ult,
    OpcodeType::Uge,
    OpcodeType::Umul,
    OpcodeType::Umad,
    OpcodeType::Umax,
    OpcodeType::Umin,
    OpcodeType::Ushr,
    OpcodeType::Utof,
    OpcodeType::Xor,
    OpcodeType::DclResource,
    OpcodeType::DclConstantBuffer,
    OpcodeType::DclSampler,
    OpcodeType::DclIndexRange,
    OpcodeType::DclGsOutputPrimitiveTopology,
    OpcodeType::DclGsInputPrimitive,
    OpcodeType::DclMaxOutputVertexCount,
    OpcodeType::DclInput,
    OpcodeType::DclInputSgv,
    OpcodeType::DclInputSiv,
    OpcodeType::DclInputPs,
    OpcodeType::DclInputPsSgv,
    OpcodeType::DclInputPsSiv,
    OpcodeType::DclOutput,
    OpcodeType::DclOutputSgv,
    OpcodeType::DclOutputSiv,
    OpcodeType::DclTemps,
    OpcodeType::DclIndexableTemp,
    OpcodeType::DclGlobalFlags,
    OpcodeType::Reserved0,
    OpcodeType::Lod,
    OpcodeType::Gather4,
    OpcodeType::SamplePos,
    OpcodeType::SampleInfo,
    OpcodeType::Reserved1,
    OpcodeType::HsDecls,
    OpcodeType::HsControlPointPhase,
    OpcodeType::HsForkPhase,
    OpcodeType::HsJoinPhase,
    OpcodeType::EmitStream,
    OpcodeType::CutStream,
    OpcodeType::EmitthencutStream,
    OpcodeType::InterfaceCall,
    OpcodeType::Bufinfo,
    OpcodeType::DerivRtxCoarse,
    OpcodeType::DerivRtxFine,
    OpcodeType::DerivRtyCoarse,
    OpcodeType::DerivRtyFine,
    OpcodeType::Gather4C,
    OpcodeType::Gather4Po,
    OpcodeType::Gather4PoC,
    OpcodeType::Rcp,
    OpcodeType::F32tof16,
    OpcodeType::F16tof32,
    OpcodeType::Uaddc,
    OpcodeType::Usubb,
    OpcodeType::Countbits,
    OpcodeType::FirstbitHi,
    OpcodeType::FirstbitLo,
    OpcodeType::FirstbitShi,
    OpcodeType::Ubfe,
    OpcodeType::Ibfe,
    OpcodeType::Bfi,
    OpcodeType::Bfrev,
    OpcodeType::Swapc,
    OpcodeType::DclStream,
    OpcodeType::DclFunctionBody,
    OpcodeType::DclFunctionTable,
    OpcodeType::DclInterface,
    OpcodeType::DclInputControlPointCount,
    OpcodeType::DclOutputControlPointCount,
    OpcodeType::DclTessDomain,
    OpcodeType::DclTessPartitioning,
    OpcodeType::DclTessOutputPrimitive,
    OpcodeType::DclHsMaxTessfactor,
    OpcodeType::DclHsForkPhaseInstanceCount,
    OpcodeType::DclHsJoinPhaseInstanceCount,
    OpcodeType::DclThreadGroup,
    OpcodeType::DclUnorderedAccessViewTyped,
    OpcodeType::DclUnorderedAccessViewRaw,
    OpcodeType::DclUnorderedAccessViewStructured,
    OpcodeType::DclThreadGroupSharedMemoryRaw,
    OpcodeType::DclThreadGroupSharedMemoryStructured,
    OpcodeType::DclResourceRaw,
    OpcodeType::DclResourceStructured,
    OpcodeType::LdUavTyped,
    OpcodeType::StoreUavTyped,
    OpcodeType::LdRaw,
    OpcodeType::StoreRaw,
    OpcodeType::LdStructured,
    OpcodeType::StoreStructured,
    OpcodeType::AtomicAnd,
    OpcodeType::AtomicOr,
    OpcodeType::AtomicXor,
    OpcodeType::AtomicCmpStore,
    OpcodeType::AtomicIadd,
    OpcodeType::AtomicImax,
    OpcodeType::AtomicImin,
    OpcodeType::AtomicUmax,
    OpcodeType::AtomicUmin,
    OpcodeType::ImmAtomicAlloc,
    OpcodeType::ImmAtomicConsume,
    OpcodeType::ImmAtomicIadd,
    OpcodeType::ImmAtomicAnd,
    OpcodeType::ImmAtomicOr,
    OpcodeType::ImmAtomicXor,
    OpcodeType::ImmAtomicExch,
    OpcodeType::ImmAtomicCmpExch,
    OpcodeType::ImmAtomicImax,
    OpcodeType::ImmAtomicImin,
    OpcodeType::ImmAtomicUmax,
    OpcodeType::ImmAtomicUmin,
    OpcodeType::Sync,
    OpcodeType::Dadd,
    OpcodeType::Dmax,
    OpcodeType::Dmin,
    OpcodeType::Dmul,
    OpcodeType::Deq,
    OpcodeType::Dge,
    OpcodeType::Dlt,
    OpcodeType::Dne,
    OpcodeType::Dmov,
    OpcodeType::Dmovc,
    OpcodeType::Dtof,
    OpcodeType::Ftod,
    OpcodeType::EvalSnapped,
    OpcodeType::EvalSampleIndex,
    OpcodeType::EvalCentroid,
    OpcodeType::DclGsInstanceCount,
];

/// Display names, indexed by code.
const NAMES: [&str; 207] = [
    "add",
    "and",
    "break",
    "breakc",
    "call",
    "callc",
    "case",
    "continue",
    "continuec",
    "cut",
    "default",
    "deriv_rtx",
    "deriv_rty",
    "discard",
    "div",
    "dp2",
    "dp3",
    "dp4",
    "else",
    "emit",
    "emitthencut",
    "endif",
    "endloop",
    "endswitch",
    "eq",
    "exp",
    "frc",
    "ftoi",
    "ftou",
    "ge",
    "iadd",
    "if",
    "ieq",
    "ige",
    "ilt",
    "imad",
    "imax",
    "imin",
    "imul",
    "ine",
    "ineg",
    "ishl",
    "ishr",
    "itof",
    "label",
    "ld",
    "ld_ms",
    "log",
    "loop",
    "lt",
    "mad",
    "min",
    "max",
    "customdata",
    "mov",
    "movc",
    "mul",
    "ne",
    "nop",
    "not",
    "or",
    "resinfo",
    "ret",
    "retc",
    "round_ne",
    "round_ni",
    "round_pi",
    "round_z",
    "rsq",
    "sample",
    "sample_c",
    "sample_c_lz",
    "sample_l",
    "sample_d",
    "sample_b",
    "sqrt",
    "switch",
    "sincos",
    "udiv",
    "ult",
    "uge",
    "umul",
    "umad",
    "umax",
    "umin",
    "ushr",
    "utof",
    "xor",
    "dcl_resource",
    "dcl_constant_buffer",
    "dcl_sampler",
    "dcl_index_range",
    "dcl_gs_output_primitive_topology",
    "dcl_gs_input_primitive",
    "dcl_max_output_vertex_count",
    "dcl_input",
    "dcl_input_sgv",
    "dcl_input_siv",
    "dcl_input_ps",
    "dcl_input_ps_sgv",
    "dcl_input_ps_siv",
    "dcl_output",
    "dcl_output_sgv",
    "dcl_output_siv",
    "dcl_temps",
    "dcl_indexable_temp",
    "dcl_global_flags",
    "reserved0",
    "lod",
    "gather4",
    "sample_pos",
    "sample_info",
    "reserved1",
    "hs_decls",
    "hs_control_point_phase",
    "hs_fork_phase",
    "hs_join_phase",
    "emit_stream",
    "cut_stream",
    "emitthencut_stream",
    "interface_call",
    "bufinfo",
    "deriv_rtx_coarse",
    "deriv_rtx_fine",
    "deriv_rty_coarse",
    "deriv_rty_fine",
    "gather4_c",
    "gather4_po",
    "gather4_po_c",
    "rcp",
    "f32tof16",
    "f16tof32",
    "uaddc",
    "usubb",
    "countbits",
    "firstbit_hi",
    "firstbit_lo",
    "firstbit_shi",
    "ubfe",
    "ibfe",
    "bfi",
    "bfrev",
    "swapc",
    "dcl_stream",
    "dcl_function_body",
    "dcl_function_table",
    "dcl_interface",
    "dcl_input_control_point_count",
    "dcl_output_control_point_count",
    "dcl_tess_domain",
    "dcl_tess_partitioning",
    "dcl_tess_output_primitive",
    "dcl_hs_max_tessfactor",
    "dcl_hs_fork_phase_instance_count",
    "dcl_hs_join_phase_instance_count",
    "dcl_thread_group",
    "dcl_unordered_access_view_typed",
    "dcl_unordered_access_view_raw",
    "dcl_unordered_access_view_structured",
    "dcl_thread_group_shared_memory_raw",
    "dcl_thread_group_shared_memory_structured",
    "dcl_resource_raw",
    "dcl_resource_structured",
    "ld_uav_typed",
    "store_uav_typed",
    "ld_raw",
    "store_raw",
    "ld_structured",
    "store_structured",
    "atomic_and",
    "atomic_or",
    "atomic_xor",
    "atomic_cmp_store",
    "atomic_iadd",
    "atomic_imax",
    "atomic_imin",
    "atomic_umax",
    "atomic_umin",
    "imm_atomic_alloc",
    "imm_atomic_consume",
    "imm_atomic_iadd",
    "imm_atomic_and",
    "imm_atomic_or",
    "imm_atomic_xor",
    "imm_atomic_exch",
    "imm_atomic_cmp_exch",
    "imm_atomic_imax",
    "imm_atomic_imin",
    "imm_atomic_umax",
    "imm_atomic_umin",
    "sync",
    "dadd",
    "dmax",
    "dmin",
    "dmul",
    "deq",
    "dge",
    "dlt",
    "dne",
    "dmov",
    "dmovc",
    "dtof",
    "ftod",
    "eval_snapped",
    "eval_sample_index",
    "eval_centroid",
    "dcl_gs_instance_count",
];

impl OpcodeType {
    /// Decode an opcode-type code. Codes past the D3D11 set return `None`.
    pub fn from_code(code: u16) -> Option<Self> {
        ALL.get(code as usize).copied()
    }

    pub fn code(self) -> u16 {
        self as u16
    }

    /// Lower-case assembly name (e.g. `dcl_temps`, `imm_atomic_alloc`).
    pub fn name(self) -> &'static str {
        NAMES[self as usize]
    }

    /// Whether this opcode introduces an opaque custom-data block whose length
    /// lives in the second word instead of the instruction token.
    pub fn is_custom_data(self) -> bool {
        self == Self::Customdata
    }

    pub fn is_declaration(self) -> bool {
        let code = self.code();
        (88..=106).contains(&code)
            || (143..=162).contains(&code)
            || self == Self::DclGsInstanceCount
    }
}

impl std::fmt::Display for OpcodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Name for a raw opcode-type code, for diagnostics over unknown codes.
pub fn opcode_name(code: u16) -> &'static str {
    OpcodeType::from_code(code).map_or("unknown_opcode", OpcodeType::name)
}

/// Class of a custom-data block (bits 11-31 of its first word).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomDataClass {
    Comment,
    DebugInfo,
    Opaque,
    ImmediateConstantBuffer,
    ShaderMessage,
    ClipPlaneConstantMappings,
    /// Class outside the known set.
    Raw(u32),
}

impl CustomDataClass {
    pub fn from_u32(v: u32) -> Self {
        match v {
            0 => Self::Comment,
            1 => Self::DebugInfo,
            2 => Self::Opaque,
            3 => Self::ImmediateConstantBuffer,
            4 => Self::ShaderMessage,
            5 => Self::ClipPlaneConstantMappings,
            _ => Self::Raw(v),
        }
    }

    pub fn as_u32(self) -> u32 {
        match self {
            Self::Comment => 0,
            Self::DebugInfo => 1,
            Self::Opaque => 2,
            Self::ImmediateConstantBuffer => 3,
            Self::ShaderMessage => 4,
            Self::ClipPlaneConstantMappings => 5,
            Self::Raw(v) => v,
        }
    }
}
